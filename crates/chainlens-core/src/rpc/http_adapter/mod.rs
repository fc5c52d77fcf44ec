//! Native JSON-RPC client for daemon endpoints.
//!
//! Implements [`NodeRpc`](super::NodeRpc) over JSON-RPC 1.0 using `reqwest`,
//! with basic auth (explicit, URL-embedded, or cookie file) and optional
//! outbound request rate limiting.

mod client;
mod connection;
mod protocol;

pub use client::{HttpRpcClient, RpcClientOptions};
pub use connection::redact_connection;
