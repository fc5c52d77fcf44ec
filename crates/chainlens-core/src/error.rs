#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("RPC communication failure: {0}")]
    Rpc(#[from] RpcError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("failed to decode custom transaction {txid}: {message}")]
    Decode { txid: String, message: String },

    #[error("invalid daemon data: {0}")]
    InvalidData(String),

    #[error("storage failure: {0}")]
    Storage(String),

    #[error("snapshot parse error at line {line}: {message}")]
    SnapshotParse { line: usize, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// How a daemon call failed.
///
/// `Transport` and `InvalidResponse` mean the daemon could not be talked
/// to properly; `ServerError`/`NonStandardError` carry the daemon's own
/// rejection verbatim; `EmptyResponse` is a well-formed reply with neither
/// a result nor an error.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("server error {code}: {message}")]
    ServerError { code: i64, message: String },

    #[error("non-standard error payload: {0}")]
    NonStandardError(serde_json::Value),

    #[error("no error or result found in response: {body}")]
    EmptyResponse { body: String },
}

impl RpcError {
    /// `true` when the daemon answered and rejected the call itself.
    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::ServerError { .. } | Self::NonStandardError(_))
    }
}
