use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{BuyerRoster, SaleRecord};

/// Liters and money summed over a set of sales.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub total_quantity: f64,
    pub total_amount: f64,
}

/// Totals for one buyer, a row of the overall summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuyerTotals {
    pub buyer: String,
    pub totals: Totals,
}

/// Per-buyer totals in roster order plus the grand total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesSummary {
    pub buyers: Vec<BuyerTotals>,
    pub total: Totals,
}

/// Sum quantity and amount over records.
pub fn compute_totals<'a, I>(records: I) -> Totals
where
    I: IntoIterator<Item = &'a SaleRecord>,
{
    records.into_iter().fold(Totals::default(), |acc, record| Totals {
        total_quantity: acc.total_quantity + record.quantity,
        total_amount: acc.total_amount + record.amount(),
    })
}

/// Totals for a single buyer. Zero when the buyer has no sales.
pub fn compute_buyer_totals(buyer: &str, records: &[SaleRecord]) -> Totals {
    compute_totals(records.iter().filter(|r| r.buyer == buyer))
}

/// Build the summary table: one row per roster buyer, including buyers
/// without sales. Records of buyers outside the roster still count towards
/// the grand total.
pub fn build_summary(roster: &BuyerRoster, records: &[SaleRecord]) -> SalesSummary {
    let buyers = roster
        .names()
        .iter()
        .map(|buyer| BuyerTotals {
            buyer: buyer.clone(),
            totals: compute_buyer_totals(buyer, records),
        })
        .collect();

    SalesSummary {
        buyers,
        total: compute_totals(records),
    }
}

/// Find the record holding the `(buyer, date)` key.
pub fn find_sale<'a>(
    records: &'a [SaleRecord],
    buyer: &str,
    date: NaiveDate,
) -> Option<&'a SaleRecord> {
    records.iter().find(|r| r.matches(buyer, date))
}
