//! Shared test helpers for `chainlens-core` unit tests.
//!
//! Builders for storage records and daemon replies so that tests across
//! modules share a single source of truth for dummy data construction.

use crate::rpc::AnchorEntry;
use crate::types::{BlockRecord, TransactionRecord};

pub const CHAIN: &str = "DFI";
pub const NETWORK: &str = "mainnet";

// ==============================================================================
// Txid Helpers
// ==============================================================================

/// A deterministic 64-hex-character txid from a single distinguishing byte.
pub fn txid_hex(b: u8) -> String {
    format!("{b:02x}{}", "0".repeat(62))
}

// ==============================================================================
// Record Builders
// ==============================================================================

/// A plain (non-custom) transaction record at `block_height`.
pub fn make_tx_record(txid: &str, block_height: Option<i64>) -> TransactionRecord {
    TransactionRecord {
        chain: CHAIN.to_owned(),
        network: NETWORK.to_owned(),
        txid: txid.to_owned(),
        block_height,
        block_hash: None,
        block_time: None,
        block_time_normalized: None,
        coinbase: false,
        locktime: 0,
        input_count: 1,
        output_count: 2,
        size: 250,
        fee: 1_000,
        value: 50_000,
        tx_type: None,
        is_custom: false,
        custom_data: None,
        wallets: Vec::new(),
    }
}

/// A custom transaction record carrying `custom_data` of type `tx_type`.
pub fn make_custom_record(
    txid: &str,
    block_height: Option<i64>,
    tx_type: &str,
    custom_data: serde_json::Value,
) -> TransactionRecord {
    TransactionRecord {
        tx_type: Some(tx_type.to_owned()),
        is_custom: true,
        custom_data: Some(custom_data),
        ..make_tx_record(txid, block_height)
    }
}

/// A block record at `height` with a hash derived from the height.
pub fn make_block(height: u64) -> BlockRecord {
    BlockRecord {
        chain: CHAIN.to_owned(),
        network: NETWORK.to_owned(),
        hash: format!("{height:064x}"),
        height,
        version: 536_870_912,
        size: 1_000,
        merkle_root: format!("{:064x}", height + 1),
        time: None,
        time_normalized: None,
        nonce: 0,
        bits: 0x1d00_ffff,
        previous_block_hash: None,
        next_block_hash: None,
        reward: 0,
        transaction_count: 1,
        btc_tx_hash: None,
    }
}

// ==============================================================================
// Daemon Reply Builders
// ==============================================================================

/// An `spv_listanchors` entry at `height`.
pub fn make_anchor(height: u64, active: bool) -> AnchorEntry {
    let mut extra = serde_json::Map::new();
    extra.insert("btcBlockHeight".to_owned(), serde_json::json!(600_000 + height));
    AnchorEntry {
        defi_block_height: height,
        active,
        btc_tx_hash: Some(format!("btc{height}")),
        extra,
    }
}

/// JSON array for an `spv_listanchors` reply.
pub fn anchors_reply(anchors: &[AnchorEntry]) -> serde_json::Value {
    serde_json::to_value(anchors).expect("anchors must serialize")
}

/// JSON array for a `getchaintips` reply whose active tip is at `height`.
pub fn chain_tips_reply(height: u64) -> serde_json::Value {
    serde_json::json!([{
        "height": height,
        "hash": format!("{height:064x}"),
        "branchlen": 0,
        "status": "active",
    }])
}
