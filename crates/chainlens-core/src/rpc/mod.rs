//! Daemon JSON-RPC abstraction layer.
//!
//! Defines the [`NodeRpc`] trait and provides an HTTP JSON-RPC
//! implementation ([`HttpRpcClient`]) plus a test mock (`mock::MockRpc`).
//!
//! Implementations supply a single primitive, [`NodeRpc::call`]. Every typed
//! method is built on top of it, so transport behavior lives in one place.

mod http_adapter;
#[cfg(test)]
pub mod mock;
mod parsing;
pub mod types;

pub use http_adapter::{redact_connection, HttpRpcClient, RpcClientOptions};
pub use types::{AnchorBounds, AnchorEntry, ChainTip, SmartFeeEstimate, TokenInfo};

use std::collections::HashMap;

use async_trait::async_trait;
use bitcoin::{BlockHash, Txid};
use serde::de::DeserializeOwned;

use crate::error::CoreError;

use parsing::parse_fee_rate;

/// Issue one request and deserialize the result into `T`.
///
/// This is the single-result future the typed methods compose; a result of
/// the wrong shape becomes [`CoreError::InvalidData`].
pub async fn call_typed<T, R>(
    rpc: &R,
    method: &str,
    params: Vec<serde_json::Value>,
) -> Result<T, CoreError>
where
    T: DeserializeOwned,
    R: NodeRpc + ?Sized,
{
    let raw = rpc.call(method, params).await?;
    serde_json::from_value(raw)
        .map_err(|e| CoreError::InvalidData(format!("invalid {method} result: {e}")))
}

/// The daemon RPC methods chainlens needs.
#[async_trait]
pub trait NodeRpc: Send + Sync {
    /// Issue one request and return its `result` field.
    async fn call(
        &self,
        method: &str,
        params: Vec<serde_json::Value>,
    ) -> Result<serde_json::Value, CoreError>;

    // -- chain ------------------------------------------------------------

    async fn get_chain_tip(&self) -> Result<ChainTip, CoreError> {
        let tips: Vec<ChainTip> = call_typed(self, "getchaintips", Vec::new()).await?;
        tips.into_iter()
            .next()
            .ok_or_else(|| CoreError::InvalidData("getchaintips returned no tips".to_owned()))
    }

    async fn get_best_block_hash(&self) -> Result<BlockHash, CoreError> {
        call_typed(self, "getbestblockhash", Vec::new()).await
    }

    async fn get_block_count(&self) -> Result<u64, CoreError> {
        call_typed(self, "getblockcount", Vec::new()).await
    }

    async fn get_block_hash(&self, height: u64) -> Result<BlockHash, CoreError> {
        call_typed(self, "getblockhash", vec![serde_json::json!(height)]).await
    }

    /// `verbosity` 0 returns serialized hex, 1 a JSON block with txids,
    /// 2 a JSON block with decoded transactions.
    async fn get_block(
        &self,
        hash: &BlockHash,
        verbosity: u8,
    ) -> Result<serde_json::Value, CoreError> {
        self.call(
            "getblock",
            vec![
                serde_json::json!(hash.to_string()),
                serde_json::json!(verbosity),
            ],
        )
        .await
    }

    /// Resolve the hash at `height`, then fetch that block as serialized hex.
    /// A failed hash lookup is returned before any `getblock` is issued.
    async fn get_block_by_height(&self, height: u64) -> Result<serde_json::Value, CoreError> {
        let hash = self.get_block_hash(height).await?;
        self.get_block(&hash, 0).await
    }

    // -- transactions -----------------------------------------------------

    async fn get_raw_transaction(
        &self,
        txid: &Txid,
        verbose: bool,
    ) -> Result<serde_json::Value, CoreError> {
        self.call(
            "getrawtransaction",
            vec![
                serde_json::json!(txid.to_string()),
                serde_json::json!(verbose),
            ],
        )
        .await
    }

    async fn get_raw_transaction_hex(&self, txid: &Txid) -> Result<String, CoreError> {
        call_typed(
            self,
            "getrawtransaction",
            vec![serde_json::json!(txid.to_string())],
        )
        .await
    }

    async fn decode_raw_transaction(&self, hex: &str) -> Result<serde_json::Value, CoreError> {
        self.call("decoderawtransaction", vec![serde_json::json!(hex)])
            .await
    }

    async fn send_raw_transaction(&self, hex: &str) -> Result<Txid, CoreError> {
        call_typed(self, "sendrawtransaction", vec![serde_json::json!(hex)]).await
    }

    async fn decode_script(&self, hex: &str) -> Result<serde_json::Value, CoreError> {
        self.call("decodescript", vec![serde_json::json!(hex)]).await
    }

    // -- fees -------------------------------------------------------------

    async fn estimate_smart_fee(&self, target: u32) -> Result<SmartFeeEstimate, CoreError> {
        let raw = self
            .call("estimatesmartfee", vec![serde_json::json!(target)])
            .await?;
        let feerate = raw.get("feerate").map(parse_fee_rate).transpose()?.flatten();
        let blocks = raw
            .get("blocks")
            .and_then(serde_json::Value::as_u64)
            .and_then(|b| u32::try_from(b).ok())
            .unwrap_or(target);
        let errors = raw
            .get("errors")
            .and_then(serde_json::Value::as_array)
            .map(|errors| {
                errors
                    .iter()
                    .filter_map(serde_json::Value::as_str)
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();
        Ok(SmartFeeEstimate {
            feerate,
            blocks,
            errors,
        })
    }

    /// Legacy `estimatefee`; `None` when the daemon answers `-1`.
    async fn estimate_fee(&self, target: u32) -> Result<Option<bitcoin::Amount>, CoreError> {
        let raw = self
            .call("estimatefee", vec![serde_json::json!(target)])
            .await?;
        parse_fee_rate(&raw)
    }

    // -- custom transactions, tokens, anchors -----------------------------

    async fn is_applied_custom_tx(&self, txid: &str, block_height: u64) -> Result<bool, CoreError> {
        call_typed(
            self,
            "isappliedcustomtx",
            vec![serde_json::json!(txid), serde_json::json!(block_height)],
        )
        .await
    }

    async fn get_token(&self, token: u32) -> Result<HashMap<String, TokenInfo>, CoreError> {
        call_typed(self, "gettoken", vec![serde_json::json!(token)]).await
    }

    async fn list_anchors(&self, bounds: AnchorBounds) -> Result<Vec<AnchorEntry>, CoreError> {
        call_typed(self, "spv_listanchors", bounds.to_params()).await
    }
}
