use chrono::NaiveDate;
use thiserror::Error;

use crate::storage::StoreError;

use super::AddOutcome;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid sale: {0}")]
    Validation(String),

    #[error("Failed to load sales: {0}")]
    Fetch(#[source] StoreError),

    #[error("Failed to save sale: {0}")]
    Write(#[source] StoreError),

    #[error("No sales found for {buyer} on {date}")]
    NotFound { buyer: String, date: NaiveDate },

    #[error("Sales service unreachable: {0}")]
    Network(#[source] StoreError),

    /// The store accepted the change but the follow-up reload failed.
    /// The view is stale; do not re-issue the change.
    #[error("Change was saved, but reloading sales failed: {source}")]
    Reload {
        applied: Option<AddOutcome>,
        #[source]
        source: StoreError,
    },
}

impl LedgerError {
    /// Map a failed read. Connectivity problems are reported as `Network`.
    pub(crate) fn from_fetch(err: StoreError) -> Self {
        match err {
            StoreError::Unreachable(_) => LedgerError::Network(err),
            other => LedgerError::Fetch(other),
        }
    }

    /// Map a failed mutation of the `(buyer, date)` key.
    pub(crate) fn from_write(err: StoreError, buyer: &str, date: NaiveDate) -> Self {
        match err {
            StoreError::Unreachable(_) => LedgerError::Network(err),
            StoreError::NotFound => LedgerError::NotFound {
                buyer: buyer.to_string(),
                date,
            },
            other => LedgerError::Write(other),
        }
    }

    /// True when the store holds the requested change.
    pub fn was_applied(&self) -> bool {
        matches!(self, LedgerError::Reload { .. })
    }

    /// True for errors raised before any store call was made.
    pub fn is_validation(&self) -> bool {
        matches!(self, LedgerError::Validation(_))
    }
}
