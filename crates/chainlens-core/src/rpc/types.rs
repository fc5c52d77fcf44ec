//! Typed shapes of daemon RPC results.
//!
//! Only the fields the service relies on are typed; everything else the
//! daemon reports is kept in `extra` so it survives into API responses.

use bitcoin::{Amount, BlockHash};
use serde::{Deserialize, Serialize};

// ==============================================================================
// Chain Tip
// ==============================================================================

/// First entry of `getchaintips`: the active tip.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChainTip {
    pub height: u64,
    pub hash: BlockHash,
    #[serde(default)]
    pub branchlen: u64,
    #[serde(default)]
    pub status: String,
}

// ==============================================================================
// Tokens
// ==============================================================================

/// One token description from `gettoken`. The daemon keys the reply by
/// the token id as a string: `{"0": {"symbol": "DFI", ...}}`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TokenInfo {
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ==============================================================================
// Anchors
// ==============================================================================

/// One cross-chain anchor from `spv_listanchors`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorEntry {
    pub defi_block_height: u64,
    #[serde(default)]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub btc_tx_hash: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Optional bounds accepted by `spv_listanchors`, in parameter order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnchorBounds {
    pub min_btc_height: Option<u64>,
    pub max_btc_height: Option<u64>,
    pub min_confs: Option<u64>,
    pub max_confs: Option<u64>,
}

impl AnchorBounds {
    /// Positional params with trailing unset bounds dropped. Interior gaps
    /// are sent as `-1`, which the daemon reads as "no bound".
    pub fn to_params(&self) -> Vec<serde_json::Value> {
        let bounds = [
            self.min_btc_height,
            self.max_btc_height,
            self.min_confs,
            self.max_confs,
        ];
        let used = bounds
            .iter()
            .rposition(Option::is_some)
            .map_or(0, |last| last + 1);
        bounds[..used]
            .iter()
            .map(|bound| match bound {
                Some(value) => serde_json::json!(value),
                None => serde_json::json!(-1),
            })
            .collect()
    }
}

// ==============================================================================
// Fee Estimation
// ==============================================================================

/// Result of `estimatesmartfee`. `feerate` is per kvB and absent when the
/// daemon has not collected enough data.
#[derive(Debug, Clone, PartialEq)]
pub struct SmartFeeEstimate {
    pub feerate: Option<Amount>,
    pub blocks: u32,
    pub errors: Vec<String>,
}
