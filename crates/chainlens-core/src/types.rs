//! Domain types for chainlens' chain-state model.
//!
//! Storage records (`TransactionRecord`, `BlockRecord`) as the ingestion
//! layer persists them, their public projections, and the enriched views
//! returned to API callers (`EnrichedTransaction`, `AnchoredBlock`,
//! `AnchorTotal`).

use serde::{Deserialize, Serialize};

// ==============================================================================
// Transaction Records
// ==============================================================================

/// A transaction as persisted by the ingestion pipeline.
///
/// `block_height` is absent or negative while the transaction sits in the
/// mempool. The payload in `custom_data` is shaped by `tx_type`; see
/// [`crate::custom`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub chain: String,
    pub network: String,
    pub txid: String,
    #[serde(default)]
    pub block_height: Option<i64>,
    #[serde(default)]
    pub block_hash: Option<String>,
    #[serde(default)]
    pub block_time: Option<String>,
    #[serde(default)]
    pub block_time_normalized: Option<String>,
    #[serde(default)]
    pub coinbase: bool,
    #[serde(default)]
    pub locktime: u32,
    #[serde(default)]
    pub input_count: u32,
    #[serde(default)]
    pub output_count: u32,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub fee: i64,
    #[serde(default)]
    pub value: i64,
    #[serde(default)]
    pub tx_type: Option<String>,
    #[serde(default)]
    pub is_custom: bool,
    #[serde(default)]
    pub custom_data: Option<serde_json::Value>,
    /// Internal bookkeeping; never exposed through the API.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub wallets: Vec<String>,
}

impl TransactionRecord {
    /// The block height when the transaction is confirmed.
    pub fn confirmed_height(&self) -> Option<u64> {
        self.block_height.and_then(|h| u64::try_from(h).ok())
    }

    /// Public projection of the stored record.
    pub fn to_api(&self) -> TransactionJson {
        TransactionJson {
            txid: self.txid.clone(),
            chain: self.chain.clone(),
            network: self.network.clone(),
            block_height: self.block_height.unwrap_or(-1),
            block_hash: self.block_hash.clone(),
            block_time: self.block_time.clone(),
            block_time_normalized: self.block_time_normalized.clone(),
            coinbase: self.coinbase,
            locktime: self.locktime,
            input_count: self.input_count,
            output_count: self.output_count,
            size: self.size,
            fee: self.fee,
            value: self.value,
            tx_type: self.tx_type.clone(),
            is_custom: self.is_custom,
            custom_data: self.custom_data.clone(),
        }
    }
}

/// API shape of a transaction record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionJson {
    pub txid: String,
    pub chain: String,
    pub network: String,
    pub block_height: i64,
    pub block_hash: Option<String>,
    pub block_time: Option<String>,
    pub block_time_normalized: Option<String>,
    pub coinbase: bool,
    pub locktime: u32,
    pub input_count: u32,
    pub output_count: u32,
    pub size: u64,
    pub fee: i64,
    pub value: i64,
    pub tx_type: Option<String>,
    pub is_custom: bool,
    pub custom_data: Option<serde_json::Value>,
}

/// A transaction projection with chain-relative facts attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedTransaction {
    #[serde(flatten)]
    pub tx: TransactionJson,
    pub confirmations: i64,
    pub is_custom_tx_applied: bool,
    /// Why the custom payload is still in its stored form, when decoding
    /// was attempted and failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decode_error: Option<String>,
}

// ==============================================================================
// Block Records
// ==============================================================================

/// A block as persisted by the ingestion pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRecord {
    pub chain: String,
    pub network: String,
    pub hash: String,
    pub height: u64,
    #[serde(default)]
    pub version: i32,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub merkle_root: String,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub time_normalized: Option<String>,
    #[serde(default)]
    pub nonce: u64,
    #[serde(default)]
    pub bits: u32,
    #[serde(default)]
    pub previous_block_hash: Option<String>,
    #[serde(default)]
    pub next_block_hash: Option<String>,
    #[serde(default)]
    pub reward: i64,
    #[serde(default)]
    pub transaction_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub btc_tx_hash: Option<String>,
}

// ==============================================================================
// Anchor Views
// ==============================================================================

/// An anchor entry overlaid with its locally stored block, as one flat
/// JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnchoredBlock(pub serde_json::Map<String, serde_json::Value>);

impl AnchoredBlock {
    pub fn defi_block_height(&self) -> Option<u64> {
        self.0
            .get("defiBlockHeight")
            .and_then(serde_json::Value::as_u64)
    }

    pub fn get(&self, field: &str) -> Option<&serde_json::Value> {
        self.0.get(field)
    }
}

/// Number of active anchors the daemon reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorTotal {
    pub total: usize,
}
