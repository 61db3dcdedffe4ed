use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use super::amount;

/// One milk sale: how many liters a buyer took on a given day.
/// At most one record exists per `(buyer, date)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub buyer: String,
    /// Calendar day of the sale, serialized as `YYYY-MM-DD`
    #[serde(deserialize_with = "deserialize_sale_date")]
    pub date: NaiveDate,
    /// Liters sold (never negative)
    pub quantity: f64,
}

impl SaleRecord {
    pub fn new(buyer: impl Into<String>, date: NaiveDate, quantity: f64) -> Self {
        Self {
            buyer: buyer.into(),
            date,
            quantity,
        }
    }

    /// Amount owed for this sale at the fixed unit price.
    pub fn amount(&self) -> f64 {
        amount(self.quantity)
    }

    /// Returns true if this record holds the `(buyer, date)` key.
    pub fn matches(&self, buyer: &str, date: NaiveDate) -> bool {
        self.buyer == buyer && self.date == date
    }
}

/// A sale the user wants to record. Body of a create call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewSale {
    pub buyer: String,
    pub quantity: f64,
    pub date: NaiveDate,
}

impl NewSale {
    pub fn new(buyer: impl Into<String>, quantity: f64, date: NaiveDate) -> Self {
        Self {
            buyer: buyer.into(),
            quantity,
            date,
        }
    }

    pub fn into_record(self) -> SaleRecord {
        SaleRecord::new(self.buyer, self.date, self.quantity)
    }
}

/// Parse a sale date.
///
/// Accepts a plain `YYYY-MM-DD` day or a full RFC 3339 timestamp such as
/// `2024-01-10T00:00:00.000Z`. Timestamps are reduced to their UTC calendar
/// day so that both forms compare equal.
pub fn parse_sale_date(input: &str) -> Result<NaiveDate, ParseDateError> {
    let input = input.trim();

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(date);
    }

    DateTime::parse_from_rfc3339(input)
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .map_err(|_| ParseDateError::InvalidFormat(input.to_string()))
}

fn deserialize_sale_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_sale_date(&raw).map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseDateError {
    InvalidFormat(String),
}

impl fmt::Display for ParseDateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseDateError::InvalidFormat(input) => {
                write!(f, "invalid date '{}', expected YYYY-MM-DD", input)
            }
        }
    }
}

impl std::error::Error for ParseDateError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_parse_plain_date() {
        assert_eq!(parse_sale_date("2024-01-10"), Ok(day("2024-01-10")));
        assert_eq!(parse_sale_date(" 2024-01-10 "), Ok(day("2024-01-10")));
    }

    #[test]
    fn test_parse_timestamp_reduces_to_utc_day() {
        assert_eq!(
            parse_sale_date("2024-01-10T00:00:00.000Z"),
            Ok(day("2024-01-10"))
        );
        // 23:30 at UTC-02:00 is already the next day in UTC
        assert_eq!(
            parse_sale_date("2024-01-10T23:30:00-02:00"),
            Ok(day("2024-01-11"))
        );
    }

    #[test]
    fn test_parse_invalid_date() {
        assert!(parse_sale_date("10/01/2024").is_err());
        assert!(parse_sale_date("2024-02-30").is_err());
        assert!(parse_sale_date("").is_err());
    }

    #[test]
    fn test_record_amount() {
        let record = SaleRecord::new("Ravi", day("2024-01-10"), 3.0);
        assert_eq!(record.amount(), 135.0);
    }

    #[test]
    fn test_record_matches_key() {
        let record = SaleRecord::new("Ravi", day("2024-01-10"), 3.0);
        assert!(record.matches("Ravi", day("2024-01-10")));
        assert!(!record.matches("ravi", day("2024-01-10")));
        assert!(!record.matches("Ravi", day("2024-01-11")));
    }

    #[test]
    fn test_deserialize_store_payload() {
        let json = r#"[
            {"_id": "65a1", "buyer": "Ravi", "quantity": 5, "date": "2024-01-10T00:00:00.000Z", "__v": 0},
            {"buyer": "Bhavani", "quantity": 2.5, "date": "2024-01-11"}
        ]"#;
        let records: Vec<SaleRecord> = serde_json::from_str(json).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0], SaleRecord::new("Ravi", day("2024-01-10"), 5.0));
        assert_eq!(records[1].date, day("2024-01-11"));
        assert_eq!(records[1].quantity, 2.5);
    }

    #[test]
    fn test_new_sale_body_uses_iso_date() {
        let sale = NewSale::new("Ravi", 5.0, day("2024-01-10"));
        let body = serde_json::to_value(&sale).unwrap();

        assert_eq!(
            body,
            serde_json::json!({"buyer": "Ravi", "quantity": 5.0, "date": "2024-01-10"})
        );
    }
}
