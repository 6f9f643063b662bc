//! Derived identity model.

use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

/// Activity snapshot for one address.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IdentityStats {
    pub address: String,
    pub shortened_address: String,
    pub tx_count: usize,
    pub first_tx_date: Option<String>,
    pub total_in_eth: Decimal,
    pub total_out_eth: Decimal,
    pub total_gas_eth: Decimal,
    pub active_days: usize,
    pub builder_score: u32,
    pub no_activity: bool,
}

/// Rank band derived from the builder score. Five fixed bands; the color
/// is a presentation hint carried through to clients.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Rank {
    pub tier: &'static str,
    pub label: &'static str,
    pub color: &'static str,
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label, self.tier)
    }
}

/// Position on the XP curve: 1000 XP per level, levels start at 1.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct XpState {
    pub total_xp: u64,
    pub level: u64,
    pub current_level_xp: u64,
    pub next_level_xp: u64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Badge {
    pub icon: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TimelineEvent {
    pub icon: &'static str,
    pub label: &'static str,
    pub date: String,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenSummary {
    pub token_count: usize,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NftSummary {
    pub nft_count: usize,
}

/// Display row for one distinct token contract.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TokenDisplay {
    pub name: String,
    pub symbol: String,
}

/// Display row for one distinct NFT collection.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NftDisplay {
    pub name: String,
    pub collection: String,
}

/// The assembled identity profile.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub identity_stats: IdentityStats,
    pub token_summary: TokenSummary,
    pub nft_summary: NftSummary,
    pub tokens: Vec<TokenDisplay>,
    pub nfts: Vec<NftDisplay>,
    pub rank: Rank,
    pub badges: Vec<Badge>,
    pub timeline: Vec<TimelineEvent>,
    pub xp: XpState,
    pub ens: Option<String>,
    pub base_name: Option<String>,
    /// Set only on the no-activity path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
