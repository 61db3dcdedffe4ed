// Storage layer - the narrow interface to wherever sales are persisted.
// The ledger only ever talks to a `SalesStore`; the HTTP sales service is the
// production backend, SQLite and memory stores share its semantics.

mod http;
mod memory;
mod sqlite;

pub use http::*;
pub use memory::*;
pub use sqlite::*;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::domain::{NewSale, SaleRecord};

/// SQL migration for the sales table
pub const MIGRATION_001_SALES: &str = include_str!("migrations/001_sales.sql");

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sales store unreachable: {0}")]
    Unreachable(String),

    #[error("no sale matches the request")]
    NotFound,

    #[error("a sale already exists for this buyer and date")]
    Conflict,

    #[error("sales store rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("could not decode sales store response: {0}")]
    Decode(String),

    #[error("storage backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

/// Record-oriented operations over the "sales" collection.
#[async_trait]
pub trait SalesStore: Send + Sync {
    /// Every stored sale, in the store's order.
    async fn list(&self) -> Result<Vec<SaleRecord>, StoreError>;

    async fn create(&self, sale: &NewSale) -> Result<(), StoreError>;

    /// Overwrite the quantity of the sale keyed by `(buyer, date)`.
    async fn update_quantity(
        &self,
        buyer: &str,
        date: NaiveDate,
        quantity: f64,
    ) -> Result<(), StoreError>;

    async fn delete(&self, buyer: &str, date: NaiveDate) -> Result<(), StoreError>;

    /// Remove every sale of `buyer` dated on or before `as_of`'s UTC day.
    async fn reset(&self, buyer: &str, as_of: DateTime<Utc>) -> Result<(), StoreError>;
}
