use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::{
    build_summary, compute_buyer_totals, compute_totals, find_sale, BuyerRoster, NewSale,
    SaleRecord, SalesSummary, Totals,
};
use crate::storage::{SalesStore, StoreError};

use super::LedgerError;

/// The sales ledger: the loaded view of every sale plus the operations that
/// change it.
///
/// The view is only ever replaced wholesale by [`SalesLedger::load`]. Every
/// mutation goes to the store first and is followed by a reload, so the view
/// always mirrors the store's last answer.
pub struct SalesLedger {
    store: Arc<dyn SalesStore>,
    roster: BuyerRoster,
    records: RwLock<Vec<SaleRecord>>,
}

/// What `add_or_update` did.
#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    /// No sale existed for the key; a new one was stored.
    Created,
    /// A sale existed and its quantity was overwritten.
    Updated { previous: SaleRecord },
    /// A sale existed and the caller chose not to overwrite it.
    Declined { existing: SaleRecord },
}

impl SalesLedger {
    /// Create a ledger over the given store. The view starts empty; call
    /// [`SalesLedger::load`] to fill it.
    pub fn new(store: Arc<dyn SalesStore>, roster: BuyerRoster) -> Self {
        Self {
            store,
            roster,
            records: RwLock::new(Vec::new()),
        }
    }

    pub fn roster(&self) -> &BuyerRoster {
        &self.roster
    }

    // ========================
    // Loading
    // ========================

    /// Fetch every sale from the store and replace the view.
    /// On failure the previous view is kept.
    pub async fn load(&self) -> Result<Vec<SaleRecord>, LedgerError> {
        self.refresh().await.map_err(|e| {
            tracing::warn!(error = %e, "failed to load sales");
            LedgerError::from_fetch(e)
        })
    }

    async fn refresh(&self) -> Result<Vec<SaleRecord>, StoreError> {
        let records = self.store.list().await?;

        tracing::debug!(count = records.len(), "loaded sales");
        *self.records.write().await = records.clone();
        Ok(records)
    }

    /// Reload after a write the store already accepted. A failure here is a
    /// `Reload` error carrying what was applied, never a write error.
    async fn reload_after_write(&self, applied: Option<AddOutcome>) -> Result<(), LedgerError> {
        match self.refresh().await {
            Ok(_) => Ok(()),
            Err(e) => {
                tracing::warn!(error = %e, "change saved but reload failed, view is stale");
                Err(LedgerError::Reload { applied, source: e })
            }
        }
    }

    /// Snapshot of the loaded sales, in store order.
    pub async fn records(&self) -> Vec<SaleRecord> {
        self.records.read().await.clone()
    }

    /// Loaded sales of one buyer.
    pub async fn sales_for(&self, buyer: &str) -> Vec<SaleRecord> {
        self.records
            .read()
            .await
            .iter()
            .filter(|r| r.buyer == buyer)
            .cloned()
            .collect()
    }

    // ========================
    // Mutations
    // ========================

    /// First step of adding a sale: the loaded sale already holding this
    /// `(buyer, date)`, if any. The caller decides whether to overwrite it and
    /// passes that decision to [`SalesLedger::add_or_update`].
    pub async fn check_for_conflict(&self, buyer: &str, date: NaiveDate) -> Option<SaleRecord> {
        find_sale(&self.records.read().await, buyer, date).cloned()
    }

    /// Record a sale, reconciling it with the loaded view.
    ///
    /// If the key is free the sale is created. If a sale already holds the key
    /// its quantity is overwritten when `proceed_with_update` is true, and
    /// nothing happens otherwise. The view is reloaded after a write.
    pub async fn add_or_update(
        &self,
        sale: NewSale,
        proceed_with_update: bool,
    ) -> Result<AddOutcome, LedgerError> {
        self.validate_buyer(&sale.buyer)?;
        validate_quantity(sale.quantity)?;

        let outcome = match self.check_for_conflict(&sale.buyer, sale.date).await {
            Some(existing) if !proceed_with_update => {
                tracing::info!(
                    buyer = %sale.buyer,
                    date = %sale.date,
                    "sale already recorded, update declined"
                );
                return Ok(AddOutcome::Declined { existing });
            }
            Some(previous) => {
                self.store
                    .update_quantity(&sale.buyer, sale.date, sale.quantity)
                    .await
                    .map_err(|e| {
                        tracing::warn!(error = %e, buyer = %sale.buyer, date = %sale.date, "failed to update sale");
                        LedgerError::from_write(e, &sale.buyer, sale.date)
                    })?;
                tracing::info!(
                    buyer = %sale.buyer,
                    date = %sale.date,
                    from = previous.quantity,
                    to = sale.quantity,
                    "updated sale quantity"
                );
                AddOutcome::Updated { previous }
            }
            None => {
                self.store.create(&sale).await.map_err(|e| {
                    tracing::warn!(error = %e, buyer = %sale.buyer, date = %sale.date, "failed to create sale");
                    LedgerError::from_write(e, &sale.buyer, sale.date)
                })?;
                tracing::info!(
                    buyer = %sale.buyer,
                    date = %sale.date,
                    quantity = sale.quantity,
                    "recorded sale"
                );
                AddOutcome::Created
            }
        };

        self.reload_after_write(Some(outcome.clone())).await?;
        Ok(outcome)
    }

    /// Remove the sale keyed by `(buyer, date)`, then reload.
    pub async fn delete(&self, buyer: &str, date: NaiveDate) -> Result<(), LedgerError> {
        self.validate_buyer(buyer)?;

        self.store.delete(buyer, date).await.map_err(|e| {
            tracing::warn!(error = %e, %buyer, %date, "failed to delete sale");
            LedgerError::from_write(e, buyer, date)
        })?;
        tracing::info!(%buyer, %date, "deleted sale");

        self.reload_after_write(None).await?;
        Ok(())
    }

    /// Remove every sale of `buyer` dated on or before `as_of` (default: now),
    /// then reload.
    pub async fn reset(
        &self,
        buyer: &str,
        as_of: Option<DateTime<Utc>>,
    ) -> Result<(), LedgerError> {
        self.validate_buyer(buyer)?;
        let as_of = as_of.unwrap_or_else(Utc::now);

        self.store.reset(buyer, as_of).await.map_err(|e| {
            tracing::warn!(error = %e, %buyer, %as_of, "failed to reset sales");
            LedgerError::from_write(e, buyer, as_of.date_naive())
        })?;
        tracing::info!(%buyer, %as_of, "reset sales");

        self.reload_after_write(None).await?;
        Ok(())
    }

    // ========================
    // Aggregates
    // ========================

    /// Liters and amount of one buyer's loaded sales. Zero when there are none.
    pub async fn totals_for(&self, buyer: &str) -> Totals {
        compute_buyer_totals(buyer, &self.records.read().await)
    }

    /// Liters and amount over every loaded sale.
    pub async fn grand_totals(&self) -> Totals {
        compute_totals(self.records.read().await.iter())
    }

    /// Per-buyer totals for the whole roster, plus the grand total.
    pub async fn summary(&self) -> SalesSummary {
        build_summary(&self.roster, &self.records.read().await)
    }

    fn validate_buyer(&self, buyer: &str) -> Result<(), LedgerError> {
        if buyer.trim().is_empty() {
            return Err(LedgerError::Validation("buyer must not be empty".to_string()));
        }
        if !self.roster.contains(buyer) {
            return Err(LedgerError::Validation(format!(
                "unknown buyer '{}' (known: {})",
                buyer,
                self.roster.names().join(", ")
            )));
        }
        Ok(())
    }
}

fn validate_quantity(quantity: f64) -> Result<(), LedgerError> {
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(LedgerError::Validation(format!(
            "quantity must be a positive number of liters, got {}",
            quantity
        )));
    }
    Ok(())
}
