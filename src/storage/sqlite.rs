use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Row, SqlitePool};

use crate::domain::{parse_sale_date, NewSale, SaleRecord};

use super::{SalesStore, StoreError, MIGRATION_001_SALES};

/// Sales persisted in a local SQLite file, keyed by `(buyer, date)`.
pub struct SqliteSalesStore {
    pool: SqlitePool,
}

impl SqliteSalesStore {
    /// Create a new store with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_SALES)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a database (connect + migrate), creating the file if needed.
    pub async fn init(database_path: &str) -> Result<Self> {
        let store = Self::connect(&format!("sqlite:{}?mode=rwc", database_path)).await?;
        store.migrate().await?;
        Ok(store)
    }

    /// Open an existing database file.
    pub async fn open(database_path: &str) -> Result<Self> {
        Self::connect(&format!("sqlite:{}", database_path)).await
    }

    fn row_to_sale(row: &sqlx::sqlite::SqliteRow) -> Result<SaleRecord> {
        let date_str: String = row.get("date");

        Ok(SaleRecord {
            buyer: row.get("buyer"),
            date: parse_sale_date(&date_str).context("Invalid sale date")?,
            quantity: row.get("quantity"),
        })
    }
}

fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[async_trait]
impl SalesStore for SqliteSalesStore {
    async fn list(&self) -> Result<Vec<SaleRecord>, StoreError> {
        let rows = sqlx::query("SELECT buyer, date, quantity FROM sales ORDER BY rowid")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list sales")?;

        Ok(rows
            .iter()
            .map(Self::row_to_sale)
            .collect::<Result<Vec<_>>>()?)
    }

    async fn create(&self, sale: &NewSale) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO sales (buyer, date, quantity)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(&sale.buyer)
        .bind(day_key(sale.date))
        .bind(sale.quantity)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
                Err(StoreError::Conflict)
            }
            Err(err) => Err(anyhow::Error::new(err)
                .context("Failed to save sale")
                .into()),
        }
    }

    async fn update_quantity(
        &self,
        buyer: &str,
        date: NaiveDate,
        quantity: f64,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE sales SET quantity = ? WHERE buyer = ? AND date = ?")
            .bind(quantity)
            .bind(buyer)
            .bind(day_key(date))
            .execute(&self.pool)
            .await
            .context("Failed to update sale")?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, buyer: &str, date: NaiveDate) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM sales WHERE buyer = ? AND date = ?")
            .bind(buyer)
            .bind(day_key(date))
            .execute(&self.pool)
            .await
            .context("Failed to delete sale")?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn reset(&self, buyer: &str, as_of: DateTime<Utc>) -> Result<(), StoreError> {
        // ISO days sort lexicographically
        let result = sqlx::query("DELETE FROM sales WHERE buyer = ? AND date <= ?")
            .bind(buyer)
            .bind(day_key(as_of.date_naive()))
            .execute(&self.pool)
            .await
            .context("Failed to reset sales")?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
