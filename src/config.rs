use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

use crate::application::SalesLedger;
use crate::domain::BuyerRoster;
use crate::storage::{HttpSalesStore, SalesStore, SqliteSalesStore};

/// Sales service used when none is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Request timeout used when none is configured, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where sales are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// The REST sales service at this base URL.
    Http { api_url: String, timeout: Duration },
    /// A local SQLite file.
    Sqlite { path: String },
}

/// Runtime configuration, resolved from command-line flags and environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub backend: Backend,
    pub roster: BuyerRoster,
}

impl Config {
    /// Resolve the backend: a database path wins over the API URL.
    pub fn new(
        api_url: String,
        database: Option<String>,
        timeout_secs: u64,
        buyers: Option<&str>,
    ) -> Self {
        let backend = match database {
            Some(path) => Backend::Sqlite { path },
            None => Backend::Http {
                api_url,
                timeout: Duration::from_secs(timeout_secs),
            },
        };
        let roster = buyers.map(BuyerRoster::from_list).unwrap_or_default();

        Self { backend, roster }
    }

    /// Open the configured store. A SQLite file must already be initialized.
    pub async fn open_store(&self) -> Result<Arc<dyn SalesStore>> {
        let store: Arc<dyn SalesStore> = match &self.backend {
            Backend::Http { api_url, timeout } => Arc::new(
                HttpSalesStore::new(api_url, *timeout)
                    .with_context(|| format!("Failed to set up sales service client for {}", api_url))?,
            ),
            Backend::Sqlite { path } => Arc::new(
                SqliteSalesStore::open(path)
                    .await
                    .with_context(|| format!("Failed to open database {}. Run `milkpro init` first", path))?,
            ),
        };
        Ok(store)
    }

    /// Open the store and wrap it in a ledger. Nothing is loaded yet.
    pub async fn open_ledger(&self) -> Result<SalesLedger> {
        anyhow::ensure!(!self.roster.is_empty(), "Buyer list is empty");
        let store = self.open_store().await?;
        Ok(SalesLedger::new(store, self.roster.clone()))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL.to_string(), None, DEFAULT_TIMEOUT_SECS, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_uses_http() {
        let config = Config::default();
        assert_eq!(
            config.backend,
            Backend::Http {
                api_url: DEFAULT_API_URL.to_string(),
                timeout: Duration::from_secs(30),
            }
        );
        assert_eq!(config.roster, BuyerRoster::default());
    }

    #[test]
    fn test_database_overrides_api_url() {
        let config = Config::new(
            DEFAULT_API_URL.to_string(),
            Some("sales.db".to_string()),
            30,
            Some("Ravi,Sundari"),
        );
        assert_eq!(
            config.backend,
            Backend::Sqlite {
                path: "sales.db".to_string()
            }
        );
        assert_eq!(config.roster.names(), ["Ravi", "Sundari"]);
    }

    #[tokio::test]
    async fn test_empty_roster_is_rejected() {
        let config = Config::new(DEFAULT_API_URL.to_string(), None, 30, Some(" , "));
        assert!(config.open_ledger().await.is_err());
    }
}
