// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use milkpro::application::SalesLedger;
use milkpro::domain::{BuyerRoster, NewSale};
use milkpro::storage::SqliteSalesStore;
use std::sync::Arc;
use tempfile::TempDir;

/// Helper to create a loaded ledger over a temporary SQLite database
pub async fn test_ledger() -> Result<(SalesLedger, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("sales.db");
    let store = SqliteSalesStore::init(db_path.to_str().unwrap()).await?;
    let ledger = SalesLedger::new(Arc::new(store), BuyerRoster::default());
    ledger.load().await?;
    Ok((ledger, temp_dir))
}

/// Helper to parse a date string into a NaiveDate
pub fn day(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}

/// Helper to parse a date string into midnight UTC
pub fn midnight(date_str: &str) -> DateTime<Utc> {
    day(date_str).and_hms_opt(0, 0, 0).unwrap().and_utc()
}

/// Test fixture: standard deliveries
pub struct StandardSales;

impl StandardSales {
    /// Record `(buyer, date, liters)` sales, none of them overlapping.
    pub async fn record(ledger: &SalesLedger, sales: &[(&str, &str, f64)]) -> Result<()> {
        for (buyer, date, quantity) in sales {
            ledger
                .add_or_update(NewSale::new(*buyer, *quantity, day(date)), false)
                .await?;
        }
        Ok(())
    }

    /// Bhavani and Ravi around the start of February 2024
    pub async fn create_basic(ledger: &SalesLedger) -> Result<()> {
        Self::record(
            ledger,
            &[
                ("Bhavani", "2024-01-25", 2.0),
                ("Bhavani", "2024-01-31", 2.5),
                ("Bhavani", "2024-02-01", 2.0),
                ("Bhavani", "2024-02-02", 1.5),
                ("Ravi", "2024-01-28", 3.0),
                ("Ravi", "2024-02-03", 4.0),
            ],
        )
        .await
    }
}
