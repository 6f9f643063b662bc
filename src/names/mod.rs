//! Name enrichment: reverse-resolving an address to its ENS name and its
//! Base name. Lookups are best-effort; every failure path degrades to
//! "no name" so enrichment can never fail the identity pipeline.

pub mod ens;

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::NamesConfig;

/// Names resolved for an address. Either may independently be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedNames {
    pub ens: Option<String>,
    pub base_name: Option<String>,
}

/// Reverse name lookup collaborator. Implementations absorb their own
/// failures; the identity pipeline only ever sees [`ResolvedNames`].
#[async_trait]
pub trait NameResolver: Send + Sync {
    async fn resolve(&self, address: &str) -> ResolvedNames;
}

/// Production resolver: ENS reverse record via mainnet JSON-RPC plus the
/// Base name REST API, queried concurrently.
pub struct LookupChain {
    config: NamesConfig,
    client: reqwest::Client,
}

impl LookupChain {
    pub fn new(config: NamesConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("http client");
        Self { config, client }
    }

    /// `GET {name_api}/v1/reverse/{address}`, expecting `{"name": "..."}`.
    async fn lookup_base_name(&self, address: &str) -> Option<String> {
        #[derive(Deserialize)]
        struct ReverseResponse {
            #[serde(default)]
            name: Option<String>,
        }

        let url = format!("{}/v1/reverse/{}", self.config.name_api_url, address);
        let resp = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .ok()?;
        if !resp.status().is_success() {
            debug!(status = %resp.status(), "name API returned error status");
            return None;
        }
        let body: ReverseResponse = resp.json().await.ok()?;
        body.name.filter(|n| !n.is_empty())
    }
}

#[async_trait]
impl NameResolver for LookupChain {
    async fn resolve(&self, address: &str) -> ResolvedNames {
        if !self.config.enabled {
            return ResolvedNames::default();
        }

        let (ens, base_name) = futures::join!(
            ens::reverse_lookup(&self.client, &self.config.eth_rpc_url, address),
            self.lookup_base_name(address),
        );
        debug!(ens = ?ens, base_name = ?base_name, "name lookup complete");

        ResolvedNames { ens, base_name }
    }
}
