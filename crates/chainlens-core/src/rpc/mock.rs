use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{CoreError, RpcError};

use super::NodeRpc;

#[derive(Clone)]
enum Canned {
    Result(serde_json::Value),
    ServerError { code: i64, message: String },
}

/// A mock daemon for testing. Answers from canned results keyed by method
/// (and optionally by exact params) and records every call it receives.
pub struct MockRpc {
    by_params: HashMap<(String, String), Canned>,
    by_method: HashMap<String, Canned>,
    calls: Mutex<Vec<(String, Vec<serde_json::Value>)>>,
}

impl MockRpc {
    pub fn builder() -> MockRpcBuilder {
        MockRpcBuilder {
            by_params: HashMap::new(),
            by_method: HashMap::new(),
        }
    }

    /// Every call received so far, in arrival order.
    pub fn calls(&self) -> Vec<(String, Vec<serde_json::Value>)> {
        self.calls.lock().expect("mock call log poisoned").clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.calls
            .lock()
            .expect("mock call log poisoned")
            .iter()
            .filter(|(m, _)| m == method)
            .count()
    }
}

pub struct MockRpcBuilder {
    by_params: HashMap<(String, String), Canned>,
    by_method: HashMap<String, Canned>,
}

impl MockRpcBuilder {
    /// Answer `method` with `result` whatever the params.
    pub fn with_result(mut self, method: &str, result: serde_json::Value) -> Self {
        self.by_method
            .insert(method.to_owned(), Canned::Result(result));
        self
    }

    /// Answer `method` with `result` only for exactly these params.
    pub fn with_call(
        mut self,
        method: &str,
        params: Vec<serde_json::Value>,
        result: serde_json::Value,
    ) -> Self {
        self.by_params
            .insert((method.to_owned(), params_key(&params)), Canned::Result(result));
        self
    }

    /// Answer `method` with a daemon-side JSON-RPC error.
    pub fn with_error(mut self, method: &str, code: i64, message: &str) -> Self {
        self.by_method.insert(
            method.to_owned(),
            Canned::ServerError {
                code,
                message: message.to_owned(),
            },
        );
        self
    }

    /// Register a `gettoken` answer for `id` with the given symbol.
    pub fn with_token(self, id: u32, symbol: &str) -> Self {
        let mut reply = serde_json::Map::new();
        reply.insert(
            id.to_string(),
            serde_json::json!({ "symbol": symbol, "name": symbol }),
        );
        self.with_call(
            "gettoken",
            vec![serde_json::json!(id)],
            serde_json::Value::Object(reply),
        )
    }

    pub fn build(self) -> MockRpc {
        MockRpc {
            by_params: self.by_params,
            by_method: self.by_method,
            calls: Mutex::new(Vec::new()),
        }
    }
}

fn params_key(params: &[serde_json::Value]) -> String {
    serde_json::Value::Array(params.to_vec()).to_string()
}

#[async_trait]
impl NodeRpc for MockRpc {
    async fn call(
        &self,
        method: &str,
        params: Vec<serde_json::Value>,
    ) -> Result<serde_json::Value, CoreError> {
        self.calls
            .lock()
            .expect("mock call log poisoned")
            .push((method.to_owned(), params.clone()));

        let canned = self
            .by_params
            .get(&(method.to_owned(), params_key(&params)))
            .or_else(|| self.by_method.get(method))
            .cloned();
        match canned {
            Some(Canned::Result(value)) => Ok(value),
            Some(Canned::ServerError { code, message }) => {
                Err(RpcError::ServerError { code, message }.into())
            }
            None => Err(RpcError::ServerError {
                code: -32601,
                message: format!("Method not found: {method}"),
            }
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::AnchorBounds;

    #[tokio::test]
    async fn exact_params_take_precedence_over_method_default() {
        let rpc = MockRpc::builder()
            .with_result("getblockhash", serde_json::json!("00"))
            .with_call(
                "getblockhash",
                vec![serde_json::json!(5)],
                serde_json::json!("05"),
            )
            .build();

        let five = rpc
            .call("getblockhash", vec![serde_json::json!(5)])
            .await
            .expect("must answer");
        let other = rpc
            .call("getblockhash", vec![serde_json::json!(6)])
            .await
            .expect("must answer");
        assert_eq!(five, serde_json::json!("05"));
        assert_eq!(other, serde_json::json!("00"));
        assert_eq!(rpc.call_count("getblockhash"), 2);
    }

    #[tokio::test]
    async fn block_by_height_short_circuits_on_hash_failure() {
        let rpc = MockRpc::builder()
            .with_error("getblockhash", -8, "Block height out of range")
            .with_result("getblock", serde_json::json!("00"))
            .build();

        let err = rpc
            .get_block_by_height(1_000_000)
            .await
            .expect_err("hash lookup must fail");
        assert!(matches!(
            err,
            CoreError::Rpc(RpcError::ServerError { code: -8, .. })
        ));
        assert_eq!(rpc.call_count("getblock"), 0);
    }

    #[tokio::test]
    async fn block_by_height_fetches_resolved_hash() {
        let hash = "00000000000000000000000000000000000000000000000000000000000000aa";
        let rpc = MockRpc::builder()
            .with_call(
                "getblockhash",
                vec![serde_json::json!(12)],
                serde_json::json!(hash),
            )
            .with_call(
                "getblock",
                vec![serde_json::json!(hash), serde_json::json!(0)],
                serde_json::json!("deadbeef"),
            )
            .build();

        let block = rpc.get_block_by_height(12).await.expect("must resolve");
        assert_eq!(block, serde_json::json!("deadbeef"));
        let methods: Vec<String> = rpc.calls().into_iter().map(|(m, _)| m).collect();
        assert_eq!(methods, vec!["getblockhash", "getblock"]);
    }

    #[tokio::test]
    async fn chain_tip_requires_at_least_one_tip() {
        let rpc = MockRpc::builder()
            .with_result("getchaintips", serde_json::json!([]))
            .build();
        let err = rpc.get_chain_tip().await.expect_err("empty tips must fail");
        assert!(matches!(err, CoreError::InvalidData(_)));
    }

    #[tokio::test]
    async fn chain_tip_is_first_reported_tip() {
        let rpc = MockRpc::builder()
            .with_result("getchaintips", crate::test_util::chain_tips_reply(42))
            .build();
        let tip = rpc.get_chain_tip().await.expect("tip must parse");
        assert_eq!(tip.height, 42);
        assert_eq!(tip.hash.to_string(), format!("{:064x}", 42));
        assert_eq!(tip.status, "active");
    }

    #[tokio::test]
    async fn wrongly_shaped_result_is_invalid_data() {
        let rpc = MockRpc::builder()
            .with_result("isappliedcustomtx", serde_json::json!("yes"))
            .build();
        let err = rpc
            .is_applied_custom_tx("ab", 10)
            .await
            .expect_err("string is not a bool");
        assert!(matches!(err, CoreError::InvalidData(message) if message.contains("isappliedcustomtx")));
    }

    #[tokio::test]
    async fn smart_fee_without_feerate_reports_errors() {
        let rpc = MockRpc::builder()
            .with_result(
                "estimatesmartfee",
                serde_json::json!({ "errors": ["Insufficient data or no feerate found"], "blocks": 0 }),
            )
            .build();
        let estimate = rpc.estimate_smart_fee(6).await.expect("must parse");
        assert!(estimate.feerate.is_none());
        assert_eq!(estimate.blocks, 0);
        assert_eq!(estimate.errors.len(), 1);
    }

    #[tokio::test]
    async fn list_anchors_passes_bounds_positionally() {
        let rpc = MockRpc::builder()
            .with_result("spv_listanchors", serde_json::json!([]))
            .build();
        let bounds = AnchorBounds {
            min_btc_height: Some(100),
            max_btc_height: Some(200),
            ..AnchorBounds::default()
        };
        let anchors = rpc.list_anchors(bounds).await.expect("must parse");
        assert!(anchors.is_empty());
        assert_eq!(
            rpc.calls(),
            vec![(
                "spv_listanchors".to_owned(),
                vec![serde_json::json!(100), serde_json::json!(200)]
            )]
        );
    }
}
