use serde::{Deserialize, Deserializer};

use crate::error::{CoreError, RpcError};

#[derive(serde::Serialize)]
pub(super) struct JsonRpcRequest<'a> {
    pub(super) jsonrpc: &'static str,
    pub(super) id: u64,
    pub(super) method: &'a str,
    pub(super) params: &'a [serde_json::Value],
}

#[derive(serde::Deserialize)]
pub(super) struct JsonRpcResponse {
    // `"result": null` is a legitimate answer (e.g. an unknown outpoint), so
    // presence is tracked separately from the value.
    #[serde(default, deserialize_with = "present")]
    pub(super) result: Option<serde_json::Value>,
    #[serde(default)]
    pub(super) error: Option<serde_json::Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

/// Resolve a decoded envelope into its result.
///
/// An `error` field wins over `result`; an envelope carrying neither is
/// reported as [`RpcError::EmptyResponse`] instead of a silent null.
pub(super) fn into_result(
    response: JsonRpcResponse,
    body: &str,
) -> Result<serde_json::Value, CoreError> {
    if let Some(err) = response.error {
        return Err(parse_jsonrpc_error(err));
    }
    response.result.ok_or_else(|| {
        RpcError::EmptyResponse {
            body: body.to_owned(),
        }
        .into()
    })
}

/// Parse a JSON-RPC error value into a structured `CoreError`.
///
/// The JSON-RPC spec defines errors as `{"code": <int>, "message": <string>}`.
/// If the error value matches that shape, we produce a `ServerError`;
/// otherwise the payload is forwarded untouched as `NonStandardError`.
pub(super) fn parse_jsonrpc_error(err: serde_json::Value) -> CoreError {
    #[derive(serde::Deserialize)]
    struct JsonRpcError {
        code: i64,
        message: String,
    }

    match serde_json::from_value::<JsonRpcError>(err.clone()) {
        Ok(parsed) => RpcError::ServerError {
            code: parsed.code,
            message: parsed.message,
        }
        .into(),
        Err(_) => RpcError::NonStandardError(err).into(),
    }
}
