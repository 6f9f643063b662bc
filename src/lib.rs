//! Onchain identity profiler for Base addresses.
//!
//! Pulls an address's transaction, token-transfer, and NFT-transfer
//! history from the Etherscan v2 API and derives a normalized identity
//! profile: activity stats, a 0-100 builder score, a rank band, an
//! XP/level curve, badges, and a first/latest transaction timeline,
//! enriched with reverse-resolved ENS and Base names.

pub mod config;
pub mod explorer;
pub mod identity;
pub mod names;
