//! Wire types for the Etherscan v2 account endpoints.
//!
//! The explorer returns every numeric field as a decimal string and wraps
//! each response in a `{status, message, result}` envelope where `result`
//! is an array on success but an explanatory string on some error paths
//! ("Max rate limit reached", …). The types here absorb both shapes.

use serde::Deserialize;

/// The `{status, message, result}` envelope every account endpoint returns.
///
/// `status` is `"1"` for a populated result and `"0"` for errors *and* for
/// well-formed empty results ("No transactions found"), so emptiness is
/// decided by the caller, not here.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub result: serde_json::Value,
}

impl Envelope {
    pub fn is_ok(&self) -> bool {
        self.status == "1"
    }

    /// Decode `result` as a record array, skipping any element that fails
    /// to deserialize. Non-array results (error strings, null) yield an
    /// empty vec - a partially malformed page must not abort aggregation.
    pub fn records<T: serde::de::DeserializeOwned>(&self) -> Vec<T> {
        match self.result.as_array() {
            Some(items) => items
                .iter()
                .filter_map(|v| serde_json::from_value(v.clone()).ok())
                .collect(),
            None => Vec::new(),
        }
    }
}

/// A normal transaction from `action=txlist`, ascending timestamp order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TxRecord {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    /// Transferred value in wei, as a decimal string.
    #[serde(default)]
    pub value: String,
    #[serde(default, rename = "timeStamp")]
    pub time_stamp: String,
    #[serde(default, rename = "gasUsed")]
    pub gas_used: String,
    #[serde(default, rename = "gasPrice")]
    pub gas_price: String,
}

impl TxRecord {
    /// Unix timestamp in seconds, or None when missing/unparseable.
    pub fn timestamp(&self) -> Option<i64> {
        self.time_stamp.parse().ok()
    }

    pub fn value_wei(&self) -> u128 {
        self.value.parse().unwrap_or(0)
    }

    /// gasUsed * gasPrice in wei, saturating to zero on garbage input.
    pub fn gas_cost_wei(&self) -> u128 {
        let used: u128 = self.gas_used.parse().unwrap_or(0);
        let price: u128 = self.gas_price.parse().unwrap_or(0);
        used.checked_mul(price).unwrap_or(0)
    }
}

/// A token or NFT transfer from `action=tokentx` / `action=tokennfttx`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransferRecord {
    #[serde(default, rename = "contractAddress")]
    pub contract_address: String,
    #[serde(default, rename = "tokenSymbol")]
    pub token_symbol: String,
    #[serde(default, rename = "tokenName")]
    pub token_name: String,
    /// Only present on NFT transfers.
    #[serde(default, rename = "tokenID")]
    pub token_id: String,
    #[serde(default, rename = "timeStamp")]
    pub time_stamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_with_record_array() {
        let body = r#"{
            "status": "1",
            "message": "OK",
            "result": [
                {"from": "0xabc", "to": "0xdef", "value": "1000000000000000000",
                 "timeStamp": "1700000000", "gasUsed": "21000", "gasPrice": "50"}
            ]
        }"#;
        let env: Envelope = serde_json::from_str(body).unwrap();
        assert!(env.is_ok());
        let records: Vec<TxRecord> = env.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value_wei(), 1_000_000_000_000_000_000);
        assert_eq!(records[0].timestamp(), Some(1_700_000_000));
    }

    #[test]
    fn test_envelope_with_string_result() {
        // rate-limit errors put an explanatory string where the array goes
        let body = r#"{"status": "0", "message": "NOTOK", "result": "Max rate limit reached"}"#;
        let env: Envelope = serde_json::from_str(body).unwrap();
        assert!(!env.is_ok());
        let records: Vec<TxRecord> = env.records();
        assert!(records.is_empty());
    }

    #[test]
    fn test_malformed_record_is_skipped() {
        let body = r#"{
            "status": "1",
            "message": "OK",
            "result": [
                {"from": "0xabc", "to": "0xdef", "value": "5", "timeStamp": "100"},
                "not a record",
                {"from": "0x111", "to": "0x222", "value": "7", "timeStamp": "200"}
            ]
        }"#;
        let env: Envelope = serde_json::from_str(body).unwrap();
        let records: Vec<TxRecord> = env.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].value_wei(), 7);
    }

    #[test]
    fn test_unparseable_numerics_default_to_zero() {
        let tx = TxRecord {
            value: "not-a-number".to_string(),
            time_stamp: String::new(),
            ..Default::default()
        };
        assert_eq!(tx.value_wei(), 0);
        assert_eq!(tx.gas_cost_wei(), 0);
        assert!(tx.timestamp().is_none());
    }
}
