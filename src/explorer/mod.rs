//! Block explorer client (Etherscan v2 account API).
//!
//! Three per-address accessors feed the identity pipeline: the
//! transaction list is required and propagates errors; the token and NFT
//! transfer lists are optional and degrade to empty on any failure so
//! the pipeline is never blocked by non-critical data.

pub mod fetch;
pub mod types;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ExplorerConfig;
use fetch::fetch_with_retry;
use types::{TransferRecord, TxRecord};

#[derive(Error, Debug)]
pub enum ExplorerError {
    #[error("explorer rejected the API key: {0}")]
    InvalidKey(String),
    #[error("explorer request failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: String },
}

/// Per-category activity accessors. Implemented by [`ExplorerClient`];
/// tests substitute in-memory fakes.
#[async_trait]
pub trait ActivitySource: Send + Sync {
    /// Whether a credential is configured. Checked by the pipeline before
    /// any fetch is attempted.
    fn has_credentials(&self) -> bool;

    /// Required source. An empty list is a normal outcome; errors propagate.
    async fn transactions(&self, address: &str) -> Result<Vec<TxRecord>, ExplorerError>;

    /// Optional source. Failures are absorbed and yield an empty list.
    async fn token_transfers(&self, address: &str) -> Vec<TransferRecord>;

    /// Optional source. Failures are absorbed and yield an empty list.
    async fn nft_transfers(&self, address: &str) -> Vec<TransferRecord>;
}

pub struct ExplorerClient {
    config: ExplorerConfig,
    client: reqwest::Client,
}

impl ExplorerClient {
    pub fn new(config: ExplorerConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .expect("http client");
        Self { config, client }
    }

    /// One paged `module=account` query, ascending by timestamp. Records
    /// that fail to decode are dropped rather than failing the batch.
    async fn account_records<T>(
        &self,
        action: &str,
        address: &str,
        page_size: u32,
    ) -> Result<Vec<T>, ExplorerError>
    where
        T: serde::de::DeserializeOwned,
    {
        let query = [
            ("chainId", self.config.chain_id.to_string()),
            ("module", "account".to_string()),
            ("action", action.to_string()),
            ("address", address.to_string()),
            ("page", "1".to_string()),
            ("offset", page_size.to_string()),
            ("sort", "asc".to_string()),
            ("apikey", self.config.api_key.clone()),
        ];

        let envelope = fetch_with_retry(
            &self.client,
            &self.config.api_url,
            &query,
            self.config.max_attempts,
            Duration::from_millis(self.config.base_backoff_ms),
        )
        .await?;

        let records = envelope.records();
        debug!(
            action = action,
            status = %envelope.status,
            records = records.len(),
            "explorer fetch complete"
        );
        Ok(records)
    }
}

#[async_trait]
impl ActivitySource for ExplorerClient {
    fn has_credentials(&self) -> bool {
        !self.config.api_key.is_empty()
    }

    async fn transactions(&self, address: &str) -> Result<Vec<TxRecord>, ExplorerError> {
        self.account_records("txlist", address, self.config.tx_page_size)
            .await
    }

    async fn token_transfers(&self, address: &str) -> Vec<TransferRecord> {
        match self
            .account_records("tokentx", address, self.config.transfer_page_size)
            .await
        {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "token transfer fetch failed, continuing without");
                Vec::new()
            }
        }
    }

    async fn nft_transfers(&self, address: &str) -> Vec<TransferRecord> {
        match self
            .account_records("tokennfttx", address, self.config.transfer_page_size)
            .await
        {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "NFT transfer fetch failed, continuing without");
                Vec::new()
            }
        }
    }
}
