use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::SalesLedger;
use crate::domain::{SaleRecord, SalesSummary, UNIT_PRICE};

/// Full dump of the loaded ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub unit_price: f64,
    pub records: Vec<SaleRecord>,
    pub summary: SalesSummary,
}

/// Exporter for the sales currently loaded in a ledger.
/// Nothing is fetched here; load the ledger first.
pub struct Exporter<'a> {
    ledger: &'a SalesLedger,
}

impl<'a> Exporter<'a> {
    pub fn new(ledger: &'a SalesLedger) -> Self {
        Self { ledger }
    }

    /// Export sales to CSV, optionally only one buyer's.
    pub async fn export_sales_csv<W: Write>(
        &self,
        writer: W,
        buyer: Option<&str>,
    ) -> Result<usize> {
        let records = match buyer {
            Some(buyer) => self.ledger.sales_for(buyer).await,
            None => self.ledger.records().await,
        };
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["buyer", "date", "quantity", "amount"])?;

        for record in &records {
            csv_writer.write_record([
                record.buyer.clone(),
                record.date.format("%Y-%m-%d").to_string(),
                record.quantity.to_string(),
                format!("{:.2}", record.amount()),
            ])?;
        }

        csv_writer.flush()?;
        Ok(records.len())
    }

    /// Export every loaded sale plus the summary as pretty JSON.
    pub async fn export_json<W: Write>(&self, mut writer: W) -> Result<LedgerSnapshot> {
        let snapshot = LedgerSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            unit_price: UNIT_PRICE,
            records: self.ledger.records().await,
            summary: self.ledger.summary().await,
        };

        serde_json::to_writer_pretty(&mut writer, &snapshot)?;
        writeln!(writer)?;
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BuyerRoster;
    use crate::storage::InMemorySalesStore;
    use chrono::NaiveDate;
    use std::sync::Arc;

    async fn loaded_ledger() -> SalesLedger {
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let store = Arc::new(InMemorySalesStore::with_sales(vec![
            SaleRecord::new("Ravi", date, 3.0),
            SaleRecord::new("Bhavani", date, 2.5),
        ]));
        let ledger = SalesLedger::new(store, BuyerRoster::default());
        ledger.load().await.unwrap();
        ledger
    }

    #[tokio::test]
    async fn test_export_csv() {
        let ledger = loaded_ledger().await;
        let mut out = Vec::new();

        let count = Exporter::new(&ledger)
            .export_sales_csv(&mut out, None)
            .await
            .unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "buyer,date,quantity,amount\nRavi,2024-01-10,3,135.00\nBhavani,2024-01-10,2.5,112.50\n"
        );
    }

    #[tokio::test]
    async fn test_export_csv_for_one_buyer() {
        let ledger = loaded_ledger().await;
        let mut out = Vec::new();

        let count = Exporter::new(&ledger)
            .export_sales_csv(&mut out, Some("Bhavani"))
            .await
            .unwrap();

        assert_eq!(count, 1);
        assert!(!String::from_utf8(out).unwrap().contains("Ravi"));
    }

    #[tokio::test]
    async fn test_export_json_snapshot() {
        let ledger = loaded_ledger().await;
        let mut out = Vec::new();

        let snapshot = Exporter::new(&ledger).export_json(&mut out).await.unwrap();
        assert_eq!(snapshot.records.len(), 2);
        assert_eq!(snapshot.summary.total.total_quantity, 5.5);

        let parsed: LedgerSnapshot = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed.unit_price, 45.0);
        assert_eq!(parsed.records, snapshot.records);
    }
}
