pub mod anchors;
pub mod cache;
pub mod custom;
pub mod enrich;
pub mod error;
pub mod rpc;
pub mod service;
pub mod store;
#[cfg(test)]
mod test_util;
pub mod types;

pub use error::{CoreError, RpcError};
pub use service::ChainStateService;
pub use store::{ChainStore, MemoryStore};
