//! Read access to the indexed chain data.
//!
//! [`ChainStore`] is the seam to whatever persists blocks and transactions.
//! [`MemoryStore`] keeps everything in memory and can be seeded from JSONL
//! snapshot files (`transactions.jsonl`, `blocks.jsonl`), one record per
//! line in the same camelCase shape the API serves.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::CoreError;
use crate::types::{BlockRecord, TransactionRecord};

pub const TRANSACTIONS_FILE: &str = "transactions.jsonl";
pub const BLOCKS_FILE: &str = "blocks.jsonl";

/// Storage queries the chain-state service needs. Network names are
/// compared case-insensitively.
#[async_trait]
pub trait ChainStore: Send + Sync {
    async fn find_transaction(
        &self,
        chain: &str,
        network: &str,
        txid: &str,
    ) -> Result<Option<TransactionRecord>, CoreError>;

    /// Blocks stored at any of `heights`, highest first.
    async fn find_blocks_by_heights(
        &self,
        chain: &str,
        network: &str,
        heights: &[u64],
    ) -> Result<Vec<BlockRecord>, CoreError>;

    /// Height of the highest stored block, if any.
    async fn local_tip(&self, chain: &str, network: &str) -> Result<Option<u64>, CoreError>;
}

// ==============================================================================
// In-memory store
// ==============================================================================

type TxKey = (String, String, String);
type BlockKey = (String, String, u64);

fn tx_key(chain: &str, network: &str, txid: &str) -> TxKey {
    (
        chain.to_owned(),
        network.to_ascii_lowercase(),
        txid.to_ascii_lowercase(),
    )
}

fn block_key(chain: &str, network: &str, height: u64) -> BlockKey {
    (chain.to_owned(), network.to_ascii_lowercase(), height)
}

#[derive(Default)]
pub struct MemoryStore {
    transactions: RwLock<HashMap<TxKey, TransactionRecord>>,
    blocks: RwLock<BTreeMap<BlockKey, BlockRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from the snapshot files in `dir`. A missing file
    /// leaves that collection empty; a missing directory is an error.
    pub fn from_snapshot_dir(dir: &Path) -> Result<Self, CoreError> {
        if !dir.is_dir() {
            return Err(CoreError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("snapshot directory not found: {}", dir.display()),
            )));
        }

        let transactions: Vec<TransactionRecord> = read_snapshot(&dir.join(TRANSACTIONS_FILE))?;
        let blocks: Vec<BlockRecord> = read_snapshot(&dir.join(BLOCKS_FILE))?;
        info!(
            dir = %dir.display(),
            transactions = transactions.len(),
            blocks = blocks.len(),
            "loaded store snapshot"
        );

        let transactions = transactions
            .into_iter()
            .map(|tx| (tx_key(&tx.chain, &tx.network, &tx.txid), tx))
            .collect();
        let blocks = blocks
            .into_iter()
            .map(|block| (block_key(&block.chain, &block.network, block.height), block))
            .collect();
        Ok(Self {
            transactions: RwLock::new(transactions),
            blocks: RwLock::new(blocks),
        })
    }

    pub async fn insert_transaction(&self, record: TransactionRecord) {
        let key = tx_key(&record.chain, &record.network, &record.txid);
        self.transactions.write().await.insert(key, record);
    }

    pub async fn insert_block(&self, record: BlockRecord) {
        let key = block_key(&record.chain, &record.network, record.height);
        self.blocks.write().await.insert(key, record);
    }
}

#[async_trait]
impl ChainStore for MemoryStore {
    async fn find_transaction(
        &self,
        chain: &str,
        network: &str,
        txid: &str,
    ) -> Result<Option<TransactionRecord>, CoreError> {
        Ok(self
            .transactions
            .read()
            .await
            .get(&tx_key(chain, network, txid))
            .cloned())
    }

    async fn find_blocks_by_heights(
        &self,
        chain: &str,
        network: &str,
        heights: &[u64],
    ) -> Result<Vec<BlockRecord>, CoreError> {
        let blocks = self.blocks.read().await;
        let mut found: Vec<BlockRecord> = heights
            .iter()
            .filter_map(|h| blocks.get(&block_key(chain, network, *h)).cloned())
            .collect();
        found.sort_by(|a, b| b.height.cmp(&a.height));
        found.dedup_by_key(|block| block.height);
        Ok(found)
    }

    async fn local_tip(&self, chain: &str, network: &str) -> Result<Option<u64>, CoreError> {
        let blocks = self.blocks.read().await;
        let tip = blocks
            .range(block_key(chain, network, 0)..=block_key(chain, network, u64::MAX))
            .next_back()
            .map(|((_, _, height), _)| *height);
        Ok(tip)
    }
}

// ==============================================================================
// JSONL snapshots
// ==============================================================================

fn read_snapshot<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, CoreError> {
    if !path.exists() {
        warn!(path = %path.display(), "snapshot file missing, starting empty");
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path)?;
    parse_jsonl(&content)
}

/// Parse one record per non-blank line. Errors carry the 1-based line.
fn parse_jsonl<T: DeserializeOwned>(content: &str) -> Result<Vec<T>, CoreError> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(line_num, line)| {
            serde_json::from_str(line.trim()).map_err(|e| CoreError::SnapshotParse {
                line: line_num + 1,
                message: e.to_string(),
            })
        })
        .collect()
}
