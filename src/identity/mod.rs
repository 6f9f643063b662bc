//! Identity pipeline: validate, fetch, aggregate, enrich.
//!
//! The orchestrator is generic over its two collaborators so the full
//! pipeline can run against in-memory fakes. Only two failure sources
//! are terminal: bad input and the required transaction fetch. The
//! optional transfer fetches and name enrichment degrade silently.

pub mod stats;
pub mod types;

use rust_decimal::Decimal;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::explorer::types::{TransferRecord, TxRecord};
use crate::explorer::{ActivitySource, ExplorerError};
use crate::names::NameResolver;
use types::{Identity, IdentityStats, NftSummary, TokenSummary};

const NO_ACTIVITY_MESSAGE: &str = "Sorry, it seems you don't have any transactions on Base!";

/// Most distinct tokens shown on a card.
const TOKEN_DISPLAY_LIMIT: usize = 10;
/// Most distinct NFT collections shown on a card.
const NFT_DISPLAY_LIMIT: usize = 9;

/// Terminal failure reasons for an identity computation.
#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("address must be a 0x-prefixed 40-hex-digit string")]
    InvalidAddress,
    #[error("no explorer API key configured (set ETHERSCAN_API_KEY)")]
    MissingCredential,
    #[error("explorer request failed: {0}")]
    Upstream(String),
}

impl IdentityError {
    /// Stable machine-readable code callers can branch on.
    pub fn reason(&self) -> &'static str {
        match self {
            IdentityError::InvalidAddress => "INVALID_ADDRESS",
            IdentityError::MissingCredential => "API_KEY_MISSING",
            IdentityError::Upstream(_) => "UPSTREAM_ERROR",
        }
    }
}

/// Shape check only: 0x prefix followed by exactly 40 hex digits.
pub fn is_valid_address(address: &str) -> bool {
    address.len() == 42
        && address.starts_with("0x")
        && address[2..].chars().all(|c| c.is_ascii_hexdigit())
}

pub struct IdentityService<S, R> {
    source: S,
    resolver: R,
    /// Pause between the token and NFT transfer fetches, to stay under
    /// the explorer's per-second rate limit.
    transfer_pause: Duration,
}

impl<S: ActivitySource, R: NameResolver> IdentityService<S, R> {
    pub fn new(source: S, resolver: R, transfer_pause: Duration) -> Self {
        Self {
            source,
            resolver,
            transfer_pause,
        }
    }

    /// Compute the full identity profile for `address`.
    ///
    /// Input and credential checks run before any network activity. An
    /// address with no transaction history is a success, flagged
    /// `no_activity` with zeroed stats.
    pub async fn compute(&self, address: &str) -> Result<Identity, IdentityError> {
        if !is_valid_address(address) {
            return Err(IdentityError::InvalidAddress);
        }
        if !self.source.has_credentials() {
            return Err(IdentityError::MissingCredential);
        }

        let txs = self
            .source
            .transactions(address)
            .await
            .map_err(|e| match e {
                ExplorerError::InvalidKey(_) => IdentityError::MissingCredential,
                other => IdentityError::Upstream(other.to_string()),
            })?;
        info!(address = %address, txs = txs.len(), "fetched transaction history");

        let token_transfers = self.source.token_transfers(address).await;
        tokio::time::sleep(self.transfer_pause).await;
        let nft_transfers = self.source.nft_transfers(address).await;
        debug!(
            token_transfers = token_transfers.len(),
            nft_transfers = nft_transfers.len(),
            "fetched transfer history"
        );

        let token_count = stats::distinct_contracts(&token_transfers);
        let nft_count = stats::distinct_contracts(&nft_transfers);

        let mut identity = if txs.is_empty() {
            empty_identity(address, token_count, nft_count)
        } else {
            build_identity(address, &txs, &token_transfers, &nft_transfers, token_count, nft_count)
        };

        // Enrichment last; the resolver absorbs its own failures.
        let names = self.resolver.resolve(address).await;
        identity.ens = names.ens;
        identity.base_name = names.base_name;

        info!(
            address = %identity.identity_stats.shortened_address,
            score = identity.identity_stats.builder_score,
            tier = identity.rank.tier,
            "identity computed"
        );
        Ok(identity)
    }
}

fn build_identity(
    address: &str,
    txs: &[TxRecord],
    token_transfers: &[TransferRecord],
    nft_transfers: &[TransferRecord],
    token_count: usize,
    nft_count: usize,
) -> Identity {
    let (total_in, total_out, total_gas) = stats::directional_totals(address, txs);
    let active = stats::active_days(txs);
    let score = stats::builder_score(txs.len(), active, total_out, token_count, nft_count);

    Identity {
        identity_stats: IdentityStats {
            address: address.to_string(),
            shortened_address: stats::shorten_address(address),
            tx_count: txs.len(),
            first_tx_date: stats::first_tx_date(txs),
            total_in_eth: total_in,
            total_out_eth: total_out,
            total_gas_eth: total_gas,
            active_days: active,
            builder_score: score,
            no_activity: false,
        },
        token_summary: TokenSummary { token_count },
        nft_summary: NftSummary { nft_count },
        tokens: stats::token_displays(token_transfers, TOKEN_DISPLAY_LIMIT),
        nfts: stats::nft_displays(nft_transfers, NFT_DISPLAY_LIMIT),
        rank: stats::rank_for_score(score),
        badges: stats::badges(txs.len(), active, total_out, token_count, nft_count),
        timeline: stats::timeline(txs),
        xp: stats::xp_state(txs.len(), active, total_out),
        ens: None,
        base_name: None,
        message: None,
    }
}

/// Card for an address with no transaction history. Transfer counts are
/// still reported, but the score, badges, timeline, and display lists
/// stay empty.
fn empty_identity(address: &str, token_count: usize, nft_count: usize) -> Identity {
    info!(address = %address, "no transactions found, returning empty identity");
    Identity {
        identity_stats: IdentityStats {
            address: address.to_string(),
            shortened_address: stats::shorten_address(address),
            tx_count: 0,
            first_tx_date: None,
            total_in_eth: Decimal::ZERO,
            total_out_eth: Decimal::ZERO,
            total_gas_eth: Decimal::ZERO,
            active_days: 0,
            builder_score: 0,
            no_activity: true,
        },
        token_summary: TokenSummary { token_count },
        nft_summary: NftSummary { nft_count },
        tokens: Vec::new(),
        nfts: Vec::new(),
        rank: stats::rank_for_score(0),
        badges: Vec::new(),
        timeline: Vec::new(),
        xp: stats::xp_state(0, 0, Decimal::ZERO),
        ens: None,
        base_name: None,
        message: Some(NO_ACTIVITY_MESSAGE.to_string()),
    }
}
