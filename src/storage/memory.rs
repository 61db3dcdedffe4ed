// In memory sales store.
//
// Holds sales in a vector behind a lock, keyed the same way as the sales
// service. Can be switched offline (entirely, or for reads only) to exercise
// failure paths, and counts the write calls it receives.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::domain::{NewSale, SaleRecord};

use super::{SalesStore, StoreError};

#[derive(Default)]
pub struct InMemorySalesStore {
    sales: RwLock<Vec<SaleRecord>>,
    offline: AtomicBool,
    reads_offline: AtomicBool,
    write_calls: AtomicUsize,
}

impl InMemorySalesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing set of sales.
    pub fn with_sales(sales: Vec<SaleRecord>) -> Self {
        Self {
            sales: RwLock::new(sales),
            ..Self::default()
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Make `list` fail while writes keep succeeding.
    pub fn set_reads_offline(&self, offline: bool) {
        self.reads_offline.store(offline, Ordering::SeqCst);
    }

    /// Number of create/update/delete/reset calls received, successful or not.
    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unreachable(
                "in-memory sales store offline".to_string(),
            ));
        }
        Ok(())
    }

    fn begin_write(&self) -> Result<(), StoreError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()
    }
}

#[async_trait]
impl SalesStore for InMemorySalesStore {
    async fn list(&self) -> Result<Vec<SaleRecord>, StoreError> {
        self.check_online()?;
        if self.reads_offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unreachable(
                "in-memory sales store reads offline".to_string(),
            ));
        }
        Ok(self.sales.read().await.clone())
    }

    async fn create(&self, sale: &NewSale) -> Result<(), StoreError> {
        self.begin_write()?;
        let mut guard = self.sales.write().await;
        if guard.iter().any(|r| r.matches(&sale.buyer, sale.date)) {
            return Err(StoreError::Conflict);
        }
        guard.push(sale.clone().into_record());
        Ok(())
    }

    async fn update_quantity(
        &self,
        buyer: &str,
        date: NaiveDate,
        quantity: f64,
    ) -> Result<(), StoreError> {
        self.begin_write()?;
        let mut guard = self.sales.write().await;
        let record = guard
            .iter_mut()
            .find(|r| r.matches(buyer, date))
            .ok_or(StoreError::NotFound)?;
        record.quantity = quantity;
        Ok(())
    }

    async fn delete(&self, buyer: &str, date: NaiveDate) -> Result<(), StoreError> {
        self.begin_write()?;
        let mut guard = self.sales.write().await;
        let before = guard.len();
        guard.retain(|r| !r.matches(buyer, date));
        if guard.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn reset(&self, buyer: &str, as_of: DateTime<Utc>) -> Result<(), StoreError> {
        self.begin_write()?;
        let cutoff = as_of.date_naive();
        let mut guard = self.sales.write().await;
        let before = guard.len();
        guard.retain(|r| !(r.buyer == buyer && r.date <= cutoff));
        if guard.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
