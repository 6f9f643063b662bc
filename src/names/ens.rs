//! ENS reverse resolution over raw JSON-RPC.
//!
//! Resolves `<address>.addr.reverse` through the mainnet registry, reads
//! the reverse record's name, then forward-resolves that name and only
//! reports it when it points back at the input address. The two contract
//! methods involved take a single bytes32, so the calldata is encoded by
//! hand instead of pulling in an ABI layer.

use serde_json::json;
use tiny_keccak::{Hasher, Keccak};
use tracing::debug;

/// ENS registry on Ethereum mainnet.
const ENS_REGISTRY: &str = "0x00000000000C2E074eC69A0dFb2997BA6C7d2e1e";

// First 4 bytes of keccak256 of each signature.
const SELECTOR_RESOLVER: &str = "0178b8bf"; // resolver(bytes32)
const SELECTOR_NAME: &str = "691f3431"; // name(bytes32)
const SELECTOR_ADDR: &str = "3b3b57de"; // addr(bytes32)

fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut output);
    output
}

/// EIP-137 namehash.
pub fn namehash(name: &str) -> [u8; 32] {
    let mut node = [0u8; 32];
    if name.is_empty() {
        return node;
    }
    for label in name.rsplit('.') {
        let label_hash = keccak256(label.as_bytes());
        let mut combined = [0u8; 64];
        combined[..32].copy_from_slice(&node);
        combined[32..].copy_from_slice(&label_hash);
        node = keccak256(&combined);
    }
    node
}

/// Node of the reverse record: namehash of `<hex>.addr.reverse` with the
/// address lowercased and unprefixed.
fn reverse_node(address: &str) -> [u8; 32] {
    let hex_part = address.trim_start_matches("0x").to_lowercase();
    namehash(&format!("{}.addr.reverse", hex_part))
}

fn encode_bytes32_call(selector: &str, arg: &[u8; 32]) -> String {
    format!("0x{}{}", selector, hex::encode(arg))
}

/// One `eth_call`, returning the raw hex result. Any transport or RPC
/// error yields None.
async fn eth_call(
    client: &reqwest::Client,
    rpc_url: &str,
    to: &str,
    data: String,
) -> Option<String> {
    let payload = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "eth_call",
        "params": [{"to": to, "data": data}, "latest"],
    });

    let resp = client.post(rpc_url).json(&payload).send().await.ok()?;
    if !resp.status().is_success() {
        debug!(status = %resp.status(), "eth_call returned error status");
        return None;
    }
    let body: serde_json::Value = resp.json().await.ok()?;
    body.get("result")?.as_str().map(|s| s.to_string())
}

/// Decode a single ABI word holding an address (last 20 of 32 bytes).
/// The zero address means "not set" and decodes to None.
fn decode_address(result: &str) -> Option<String> {
    let bytes = hex::decode(result.trim_start_matches("0x")).ok()?;
    if bytes.len() < 32 {
        return None;
    }
    let addr = &bytes[12..32];
    if addr.iter().all(|&b| b == 0) {
        return None;
    }
    Some(format!("0x{}", hex::encode(addr)))
}

/// Decode an ABI-encoded `string` return value: offset word, length
/// word, then the bytes.
fn decode_string(result: &str) -> Option<String> {
    let bytes = hex::decode(result.trim_start_matches("0x")).ok()?;
    if bytes.len() < 64 {
        return None;
    }

    let offset = usize::try_from(u64::from_be_bytes(bytes[24..32].try_into().ok()?)).ok()?;
    let len_end = offset.checked_add(32)?;
    if bytes.len() < len_end {
        return None;
    }

    let len = usize::try_from(u64::from_be_bytes(bytes[offset + 24..len_end].try_into().ok()?)).ok()?;
    let data_end = len_end.checked_add(len)?;
    if bytes.len() < data_end {
        return None;
    }

    let name = String::from_utf8(bytes[len_end..data_end].to_vec()).ok()?;
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

async fn resolver_for(
    client: &reqwest::Client,
    rpc_url: &str,
    node: &[u8; 32],
) -> Option<String> {
    let result = eth_call(
        client,
        rpc_url,
        ENS_REGISTRY,
        encode_bytes32_call(SELECTOR_RESOLVER, node),
    )
    .await?;
    decode_address(&result)
}

/// Forward-resolve a name to its address via its own resolver.
async fn forward_resolve(client: &reqwest::Client, rpc_url: &str, name: &str) -> Option<String> {
    let node = namehash(name);
    let resolver = resolver_for(client, rpc_url, &node).await?;
    let result = eth_call(
        client,
        rpc_url,
        &resolver,
        encode_bytes32_call(SELECTOR_ADDR, &node),
    )
    .await?;
    decode_address(&result)
}

/// Full reverse lookup: registry, reverse resolver, name, forward check.
/// Every failure path collapses to None.
pub async fn reverse_lookup(
    client: &reqwest::Client,
    rpc_url: &str,
    address: &str,
) -> Option<String> {
    let node = reverse_node(address);

    let resolver = resolver_for(client, rpc_url, &node).await?;
    let result = eth_call(
        client,
        rpc_url,
        &resolver,
        encode_bytes32_call(SELECTOR_NAME, &node),
    )
    .await?;
    let name = decode_string(&result)?;

    // A reverse record can claim any name; only report it when the name
    // resolves back to the address we started from.
    let forward = forward_resolve(client, rpc_url, &name).await?;
    if forward.eq_ignore_ascii_case(address) {
        debug!(address = %address, name = %name, "reverse record verified");
        Some(name)
    } else {
        debug!(address = %address, name = %name, forward = %forward, "reverse record failed forward check");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namehash_empty() {
        assert_eq!(namehash(""), [0u8; 32]);
    }

    #[test]
    fn test_namehash_known_vectors() {
        assert_eq!(
            hex::encode(namehash("eth")),
            "93cdeb708b7545dc668eb9280176169d1c33cfd8ed6f04690a0bcc88a93fc4ae"
        );
        assert_eq!(
            hex::encode(namehash("foo.eth")),
            "de9b09fd7c5f901e23a3f19fecc54828e9c848539801e86591bd9801b019f84f"
        );
    }

    #[test]
    fn test_reverse_node_lowercases_and_strips_prefix() {
        let a = reverse_node("0xABCDEFabcdefABCDEFabcdefABCDEFabcdefABCD");
        let b = reverse_node("0xabcdefabcdefabcdefabcdefabcdefabcdefabcd");
        assert_eq!(a, b);
        assert_eq!(
            a,
            namehash("abcdefabcdefabcdefabcdefabcdefabcdefabcd.addr.reverse")
        );
    }

    #[test]
    fn test_encode_bytes32_call() {
        let node = [0xabu8; 32];
        let data = encode_bytes32_call(SELECTOR_RESOLVER, &node);
        assert_eq!(data.len(), 2 + 8 + 64);
        assert!(data.starts_with("0x0178b8bf"));
        assert!(data.ends_with(&"ab".repeat(32)));
    }

    #[test]
    fn test_decode_address() {
        let word = format!("0x{}{}", "00".repeat(12), "11".repeat(20));
        assert_eq!(
            decode_address(&word),
            Some(format!("0x{}", "11".repeat(20)))
        );
        // zero address means no resolver
        assert_eq!(decode_address(&format!("0x{}", "00".repeat(32))), None);
        assert_eq!(decode_address("0x1234"), None);
        assert_eq!(decode_address("not hex"), None);
    }

    #[test]
    fn test_decode_string() {
        // offset 0x20, length 7, "abc.eth" padded to a word
        let mut encoded = String::from("0x");
        encoded.push_str(&format!("{:064x}", 0x20));
        encoded.push_str(&format!("{:064x}", 7));
        encoded.push_str(&hex::encode("abc.eth"));
        encoded.push_str(&"00".repeat(25));
        assert_eq!(decode_string(&encoded), Some("abc.eth".to_string()));
    }

    #[test]
    fn test_decode_string_rejects_truncated() {
        // length word claims more data than is present
        let mut encoded = String::from("0x");
        encoded.push_str(&format!("{:064x}", 0x20));
        encoded.push_str(&format!("{:064x}", 64));
        encoded.push_str(&hex::encode("abc.eth"));
        assert_eq!(decode_string(&encoded), None);
    }

    #[test]
    fn test_decode_string_empty_is_none() {
        let mut encoded = String::from("0x");
        encoded.push_str(&format!("{:064x}", 0x20));
        encoded.push_str(&format!("{:064x}", 0));
        assert_eq!(decode_string(&encoded), None);
    }
}
