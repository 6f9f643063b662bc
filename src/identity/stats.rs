//! Pure aggregation over fetched activity records.
//!
//! Everything here is deterministic: no clock, no network, no randomness.
//! Scores, ranks, XP, badges, and the timeline derive from the record
//! sets alone, so recomputing over the same input gives identical output.
//! Record lists arrive oldest-first from the explorer and are not
//! re-sorted here.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::HashSet;

use super::types::{Badge, NftDisplay, Rank, TimelineEvent, TokenDisplay, XpState};
use crate::explorer::types::{TransferRecord, TxRecord};

/// wei -> ETH shift.
const ETH_SCALE: u32 = 18;

/// XP awarded per level before the next one.
const XP_PER_LEVEL: u64 = 1000;

pub fn shorten_address(address: &str) -> String {
    if address.len() < 10 {
        return address.to_string();
    }
    format!("{}...{}", &address[..6], &address[address.len() - 4..])
}

/// Convert an integer wei amount to decimal ETH. Values beyond what a
/// 96-bit mantissa can hold are garbage upstream data and degrade to
/// zero like any other unparseable field.
fn wei_to_eth(wei: u128) -> Decimal {
    i128::try_from(wei)
        .ok()
        .and_then(|v| Decimal::try_from_i128_with_scale(v, ETH_SCALE).ok())
        .unwrap_or_default()
}

/// Inbound, outbound, and gas totals in ETH for `address`. A self-send
/// counts toward both directions. Gas is summed as gasUsed * gasPrice
/// over every record regardless of direction.
pub fn directional_totals(address: &str, txs: &[TxRecord]) -> (Decimal, Decimal, Decimal) {
    let mut total_in = Decimal::ZERO;
    let mut total_out = Decimal::ZERO;
    let mut total_gas = Decimal::ZERO;

    for tx in txs {
        if tx.to.eq_ignore_ascii_case(address) {
            total_in += wei_to_eth(tx.value_wei());
        }
        if tx.from.eq_ignore_ascii_case(address) {
            total_out += wei_to_eth(tx.value_wei());
        }
        total_gas += wei_to_eth(tx.gas_cost_wei());
    }

    (
        total_in.normalize(),
        total_out.normalize(),
        total_gas.normalize(),
    )
}

/// Number of distinct UTC calendar days with at least one transaction.
/// Records with unparseable timestamps are skipped.
pub fn active_days(txs: &[TxRecord]) -> usize {
    let mut days = HashSet::new();
    for tx in txs {
        if let Some(dt) = tx.timestamp().and_then(|ts| DateTime::from_timestamp(ts, 0)) {
            days.insert(dt.date_naive());
        }
    }
    days.len()
}

/// Count distinct contract addresses, case-insensitively. Records with
/// no contract address are ignored.
pub fn distinct_contracts(transfers: &[TransferRecord]) -> usize {
    transfers
        .iter()
        .filter(|t| !t.contract_address.is_empty())
        .map(|t| t.contract_address.to_lowercase())
        .collect::<HashSet<_>>()
        .len()
}

/// Weighted 0-100 builder score over five independently capped
/// components, rounded to the nearest integer.
pub fn builder_score(
    tx_count: usize,
    active_days: usize,
    total_out_eth: Decimal,
    token_count: usize,
    nft_count: usize,
) -> u32 {
    let out_eth = total_out_eth.to_f64().unwrap_or(0.0);
    let mut score = 0.0;

    // Transaction count, max 30
    score += f64::min(30.0, tx_count as f64 / 100.0 * 30.0);

    // Active days, max 25
    score += f64::min(25.0, active_days as f64 / 365.0 * 25.0);

    // Outbound volume tier, max 20
    if out_eth > 10.0 {
        score += 20.0;
    } else if out_eth > 1.0 {
        score += 15.0;
    } else if out_eth > 0.1 {
        score += 10.0;
    } else if out_eth > 0.0 {
        score += 5.0;
    }

    // Token diversity, max 15
    score += f64::min(15.0, token_count as f64 / 20.0 * 15.0);

    // NFT ownership tier, max 10
    if nft_count > 10 {
        score += 10.0;
    } else if nft_count > 5 {
        score += 7.0;
    } else if nft_count > 0 {
        score += 5.0;
    }

    f64::min(100.0, score).round() as u32
}

pub fn rank_for_score(score: u32) -> Rank {
    if score >= 90 {
        Rank { tier: "S", label: "Legend", color: "gold" }
    } else if score >= 75 {
        Rank { tier: "A", label: "Master", color: "purple" }
    } else if score >= 60 {
        Rank { tier: "B", label: "Expert", color: "blue" }
    } else if score >= 40 {
        Rank { tier: "C", label: "Builder", color: "green" }
    } else {
        Rank { tier: "D", label: "Explorer", color: "gray" }
    }
}

/// Uncapped XP: 10 per transaction, 50 per active day, 100 per whole
/// outbound ETH (fractions floored). Levels are 1000 XP wide and start
/// at 1.
pub fn xp_state(tx_count: usize, active_days: usize, total_out_eth: Decimal) -> XpState {
    let volume_bonus = (total_out_eth * Decimal::from(100))
        .floor()
        .to_u64()
        .unwrap_or(0);
    let total_xp = tx_count as u64 * 10 + active_days as u64 * 50 + volume_bonus;
    let level = total_xp / XP_PER_LEVEL + 1;

    XpState {
        total_xp,
        level,
        current_level_xp: (level - 1) * XP_PER_LEVEL,
        next_level_xp: level * XP_PER_LEVEL,
    }
}

/// Threshold badges. Order is fixed; every badge whose condition holds
/// is present, none are exclusive.
pub fn badges(
    tx_count: usize,
    active_days: usize,
    total_out_eth: Decimal,
    token_count: usize,
    nft_count: usize,
) -> Vec<Badge> {
    let out_eth = total_out_eth.to_f64().unwrap_or(0.0);
    let mut earned = Vec::new();

    if tx_count > 100 {
        earned.push(Badge { icon: "🔥", label: "Power User" });
    }
    if active_days > 180 {
        earned.push(Badge { icon: "⏰", label: "Long-term Builder" });
    }
    if out_eth > 10.0 {
        earned.push(Badge { icon: "💎", label: "High Volume" });
    }
    if token_count > 10 {
        earned.push(Badge { icon: "🪙", label: "Token Collector" });
    }
    if nft_count > 5 {
        earned.push(Badge { icon: "🎨", label: "NFT Enthusiast" });
    }
    if tx_count > 50 && active_days > 30 {
        earned.push(Badge { icon: "⭐", label: "Active Builder" });
    }

    earned
}

/// First and latest transaction events. The latest is emitted only when
/// it is a different record than the first, so a single-transaction
/// history yields one event even though both would carry the same date.
pub fn timeline(txs: &[TxRecord]) -> Vec<TimelineEvent> {
    let mut events = Vec::new();

    if let Some(date) = txs.first().and_then(iso_date) {
        events.push(TimelineEvent {
            icon: "🚀",
            label: "First Transaction",
            date,
        });
    }
    if txs.len() > 1 {
        if let Some(date) = txs.last().and_then(iso_date) {
            events.push(TimelineEvent {
                icon: "⚡",
                label: "Latest Transaction",
                date,
            });
        }
    }

    events
}

pub fn first_tx_date(txs: &[TxRecord]) -> Option<String> {
    txs.first().and_then(iso_date)
}

fn iso_date(tx: &TxRecord) -> Option<String> {
    tx.timestamp()
        .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
        .map(|dt| dt.to_rfc3339())
}

/// Up to `limit` distinct token contracts in first-seen order, with
/// name and symbol taken from the first transfer for each contract.
pub fn token_displays(transfers: &[TransferRecord], limit: usize) -> Vec<TokenDisplay> {
    let mut seen = HashSet::new();
    let mut rows = Vec::new();

    for t in transfers {
        if t.contract_address.is_empty() || !seen.insert(t.contract_address.to_lowercase()) {
            continue;
        }
        rows.push(TokenDisplay {
            name: if t.token_name.is_empty() {
                "Unknown Token".to_string()
            } else {
                t.token_name.clone()
            },
            symbol: if t.token_symbol.is_empty() {
                "?".to_string()
            } else {
                t.token_symbol.clone()
            },
        });
        if rows.len() == limit {
            break;
        }
    }

    rows
}

/// Up to `limit` distinct NFT collections in first-seen order. Unnamed
/// items fall back to their token id, then to their list position.
pub fn nft_displays(transfers: &[TransferRecord], limit: usize) -> Vec<NftDisplay> {
    let mut seen = HashSet::new();
    let mut rows: Vec<NftDisplay> = Vec::new();

    for t in transfers {
        if t.contract_address.is_empty() || !seen.insert(t.contract_address.to_lowercase()) {
            continue;
        }
        let name = if !t.token_name.is_empty() {
            t.token_name.clone()
        } else if !t.token_id.is_empty() {
            format!("NFT #{}", t.token_id)
        } else {
            format!("NFT #{}", rows.len())
        };
        let collection = if t.token_name.is_empty() {
            "Unknown Collection".to_string()
        } else {
            t.token_name.clone()
        };
        rows.push(NftDisplay { name, collection });
        if rows.len() == limit {
            break;
        }
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn eth(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn tx(from: &str, to: &str, value: &str, ts: &str) -> TxRecord {
        TxRecord {
            from: from.to_string(),
            to: to.to_string(),
            value: value.to_string(),
            time_stamp: ts.to_string(),
            gas_used: "0".to_string(),
            gas_price: "0".to_string(),
        }
    }

    fn transfer(contract: &str, name: &str, symbol: &str) -> TransferRecord {
        TransferRecord {
            contract_address: contract.to_string(),
            token_symbol: symbol.to_string(),
            token_name: name.to_string(),
            token_id: String::new(),
            time_stamp: "1700000000".to_string(),
        }
    }

    const ME: &str = "0x1111111111111111111111111111111111111111";
    const OTHER: &str = "0x2222222222222222222222222222222222222222";

    #[test]
    fn test_shorten_address() {
        assert_eq!(shorten_address(ME), "0x1111...1111");
        assert_eq!(
            shorten_address("0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045"),
            "0xd8dA...6045"
        );
        assert_eq!(shorten_address("0x123"), "0x123");
    }

    #[test]
    fn test_directional_totals() {
        let txs = vec![
            // inbound 1 ETH, paying 21000 gas at 1 gwei
            {
                let mut t = tx(OTHER, ME, "1000000000000000000", "1700000000");
                t.gas_used = "21000".to_string();
                t.gas_price = "1000000000".to_string();
                t
            },
            // outbound 0.5 ETH
            tx(ME, OTHER, "500000000000000000", "1700000100"),
            // self-send 0.25 ETH counts both ways
            tx(ME, ME, "250000000000000000", "1700000200"),
        ];

        let (total_in, total_out, total_gas) = directional_totals(ME, &txs);
        assert_eq!(total_in, eth("1.25"));
        assert_eq!(total_out, eth("0.75"));
        assert_eq!(total_gas, eth("0.000021"));
    }

    #[test]
    fn test_directional_totals_case_insensitive() {
        let txs = vec![tx(
            OTHER,
            "0xABCDEFabcdefABCDEFabcdefABCDEFabcdefABCD",
            "1000000000000000000",
            "1700000000",
        )];
        let (total_in, _, _) =
            directional_totals("0xabcdefabcdefabcdefabcdefabcdefabcdefabcd", &txs);
        assert_eq!(total_in, eth("1"));
    }

    #[test]
    fn test_malformed_value_counts_as_zero() {
        let txs = vec![tx(OTHER, ME, "garbage", "1700000000")];
        let (total_in, _, _) = directional_totals(ME, &txs);
        assert_eq!(total_in, Decimal::ZERO);
    }

    #[test]
    fn test_active_days_distinct_utc_days() {
        let txs = vec![
            tx(ME, OTHER, "0", "1000"),   // 1970-01-01
            tx(ME, OTHER, "0", "2000"),   // same day
            tx(ME, OTHER, "0", "90000"),  // 1970-01-02
            tx(ME, OTHER, "0", "bogus"),  // skipped
        ];
        assert_eq!(active_days(&txs), 2);
    }

    #[test]
    fn test_distinct_contracts_case_insensitive() {
        let transfers = vec![
            transfer("0xAAAA", "Token A", "A"),
            transfer("0xaaaa", "Token A", "A"),
            transfer("0xBBBB", "Token B", "B"),
            transfer("", "No Contract", "X"),
        ];
        assert_eq!(distinct_contracts(&transfers), 2);
    }

    #[test]
    fn test_score_component_caps() {
        assert_eq!(builder_score(0, 0, Decimal::ZERO, 0, 0), 0);
        assert_eq!(builder_score(100, 0, Decimal::ZERO, 0, 0), 30);
        assert_eq!(builder_score(10_000, 0, Decimal::ZERO, 0, 0), 30);
        assert_eq!(builder_score(0, 365, Decimal::ZERO, 0, 0), 25);
        assert_eq!(builder_score(0, 10_000, Decimal::ZERO, 0, 0), 25);
        assert_eq!(builder_score(0, 0, Decimal::ZERO, 20, 0), 15);
        assert_eq!(builder_score(0, 0, Decimal::ZERO, 1000, 0), 15);
    }

    #[test]
    fn test_score_volume_tiers() {
        assert_eq!(builder_score(0, 0, eth("10.5"), 0, 0), 20);
        assert_eq!(builder_score(0, 0, eth("2"), 0, 0), 15);
        assert_eq!(builder_score(0, 0, eth("0.5"), 0, 0), 10);
        assert_eq!(builder_score(0, 0, eth("0.05"), 0, 0), 5);
        assert_eq!(builder_score(0, 0, Decimal::ZERO, 0, 0), 0);
    }

    #[test]
    fn test_score_nft_tiers() {
        assert_eq!(builder_score(0, 0, Decimal::ZERO, 0, 11), 10);
        assert_eq!(builder_score(0, 0, Decimal::ZERO, 0, 6), 7);
        assert_eq!(builder_score(0, 0, Decimal::ZERO, 0, 1), 5);
        assert_eq!(builder_score(0, 0, Decimal::ZERO, 0, 0), 0);
    }

    #[test]
    fn test_score_capped_at_100() {
        let score = builder_score(10_000, 10_000, eth("100"), 1000, 100);
        assert_eq!(score, 100);
    }

    #[test]
    fn test_score_moderate_profile() {
        // 150 txs, 10 active days, 2.5 ETH out, 3 tokens, no NFTs:
        // 30 + 0.685 + 15 + 2.25 + 0 rounds to 48
        let score = builder_score(150, 10, eth("2.5"), 3, 0);
        assert_eq!(score, 48);
        assert_eq!(rank_for_score(score).tier, "C");
    }

    #[test]
    fn test_rank_boundaries() {
        assert_eq!(rank_for_score(100).tier, "S");
        assert_eq!(rank_for_score(90).tier, "S");
        assert_eq!(rank_for_score(89).tier, "A");
        assert_eq!(rank_for_score(75).tier, "A");
        assert_eq!(rank_for_score(74).tier, "B");
        assert_eq!(rank_for_score(60).tier, "B");
        assert_eq!(rank_for_score(59).tier, "C");
        assert_eq!(rank_for_score(40).tier, "C");
        assert_eq!(rank_for_score(39).tier, "D");
        assert_eq!(rank_for_score(0).tier, "D");
    }

    #[test]
    fn test_rank_labels() {
        assert_eq!(rank_for_score(95).label, "Legend");
        assert_eq!(rank_for_score(95).color, "gold");
        assert_eq!(rank_for_score(0).label, "Explorer");
        assert_eq!(rank_for_score(0).color, "gray");
    }

    #[test]
    fn test_xp_accumulation() {
        let xp = xp_state(150, 10, eth("2.5"));
        assert_eq!(xp.total_xp, 2250); // 1500 + 500 + 250
        assert_eq!(xp.level, 3);
        assert_eq!(xp.current_level_xp, 2000);
        assert_eq!(xp.next_level_xp, 3000);
    }

    #[test]
    fn test_xp_empty_history_is_level_one() {
        let xp = xp_state(0, 0, Decimal::ZERO);
        assert_eq!(xp.total_xp, 0);
        assert_eq!(xp.level, 1);
        assert_eq!(xp.current_level_xp, 0);
        assert_eq!(xp.next_level_xp, 1000);
    }

    #[test]
    fn test_xp_monotonic_in_each_input() {
        let base = xp_state(10, 5, eth("1"));
        assert!(xp_state(11, 5, eth("1")).total_xp > base.total_xp);
        assert!(xp_state(10, 6, eth("1")).total_xp > base.total_xp);
        assert!(xp_state(10, 5, eth("2")).total_xp > base.total_xp);
    }

    #[test]
    fn test_xp_level_brackets_total() {
        for (txs, days, out) in [(0, 0, "0"), (99, 1, "0.37"), (150, 10, "2.5"), (400, 200, "55")] {
            let xp = xp_state(txs, days, eth(out));
            assert!(xp.current_level_xp <= xp.total_xp);
            assert!(xp.total_xp < xp.next_level_xp);
            assert_eq!(xp.next_level_xp - xp.current_level_xp, 1000);
        }
    }

    #[test]
    fn test_badges_thresholds() {
        assert!(badges(0, 0, Decimal::ZERO, 0, 0).is_empty());

        let labels: Vec<&str> = badges(101, 181, eth("10.5"), 11, 6)
            .iter()
            .map(|b| b.label)
            .collect();
        assert_eq!(
            labels,
            vec![
                "Power User",
                "Long-term Builder",
                "High Volume",
                "Token Collector",
                "NFT Enthusiast",
                "Active Builder"
            ]
        );

        // boundary values do not qualify (days kept at 30 so the
        // tx>50 && days>30 combination rule stays off too)
        assert!(badges(100, 30, eth("10"), 10, 5).is_empty());
    }

    #[test]
    fn test_timeline_single_record() {
        let txs = vec![tx(ME, OTHER, "0", "1700000000")];
        let events = timeline(&txs);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].label, "First Transaction");
        assert_eq!(events[0].date, "2023-11-14T22:13:20+00:00");
    }

    #[test]
    fn test_timeline_two_records_same_timestamp() {
        // distinct records, identical dates: still two events
        let txs = vec![
            tx(ME, OTHER, "0", "1700000000"),
            tx(ME, OTHER, "0", "1700000000"),
        ];
        let events = timeline(&txs);
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].label, "Latest Transaction");
        assert_eq!(events[0].date, events[1].date);
    }

    #[test]
    fn test_timeline_empty() {
        assert!(timeline(&[]).is_empty());
    }

    #[test]
    fn test_token_displays_dedupe_and_fallbacks() {
        let transfers = vec![
            transfer("0xAAAA", "Alpha", "ALP"),
            transfer("0xaaaa", "Alpha Again", "ALP2"),
            transfer("0xBBBB", "", ""),
        ];
        let rows = token_displays(&transfers, 10);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "Alpha");
        assert_eq!(rows[0].symbol, "ALP");
        assert_eq!(rows[1].name, "Unknown Token");
        assert_eq!(rows[1].symbol, "?");
    }

    #[test]
    fn test_token_displays_cap() {
        let transfers: Vec<TransferRecord> = (0..30)
            .map(|i| transfer(&format!("0x{:04}", i), "T", "T"))
            .collect();
        assert_eq!(token_displays(&transfers, 10).len(), 10);
    }

    #[test]
    fn test_nft_displays_fallback_chain() {
        let mut with_id = transfer("0xAAAA", "", "");
        with_id.token_id = "42".to_string();
        let transfers = vec![
            transfer("0x1111", "Punks", "PUNK"),
            with_id,
            transfer("0xBBBB", "", ""),
        ];
        let rows = nft_displays(&transfers, 9);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].name, "Punks");
        assert_eq!(rows[0].collection, "Punks");
        assert_eq!(rows[1].name, "NFT #42");
        assert_eq!(rows[1].collection, "Unknown Collection");
        assert_eq!(rows[2].name, "NFT #2");
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let txs = vec![
            tx(ME, OTHER, "500000000000000000", "1700000000"),
            tx(OTHER, ME, "1000000000000000000", "1700090000"),
        ];
        let first = (
            directional_totals(ME, &txs),
            active_days(&txs),
            timeline(&txs),
        );
        let second = (
            directional_totals(ME, &txs),
            active_days(&txs),
            timeline(&txs),
        );
        assert_eq!(first, second);
    }
}
