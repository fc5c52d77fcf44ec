//! Chain-state queries served to API callers.
//!
//! [`ChainStateService`] ties together the per-network daemons, the local
//! store and the anchored-block cache. It is shared as
//! `Arc<ChainStateService>` across concurrent requests.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use bitcoin::Txid;
use tracing::{debug, info};

use crate::anchors::{distinct_heights, join_anchors_with_blocks, select_anchors};
use crate::cache::TtlCache;
use crate::enrich::enrich_transaction;
use crate::error::CoreError;
use crate::rpc::{AnchorBounds, AnchorEntry, NodeRpc};
use crate::store::ChainStore;
use crate::types::{AnchorTotal, AnchoredBlock, EnrichedTransaction};

pub const DEFAULT_ANCHOR_LIMIT: usize = 10;
pub const ANCHOR_CACHE_TTL: Duration = Duration::from_secs(60);
/// Live anchored-block views kept at once; `since` and `limit` come from callers.
const ANCHOR_CACHE_CAP: usize = 1024;

/// Identity of one anchored-block query. `network` is lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnchorCacheKey {
    pub chain: String,
    pub network: String,
    pub since_block: Option<u64>,
    pub limit: usize,
}

pub struct ChainStateService {
    daemons: HashMap<(String, String), Arc<dyn NodeRpc>>,
    store: Arc<dyn ChainStore>,
    anchor_cache: TtlCache<AnchorCacheKey, Vec<AnchoredBlock>>,
}

fn anchor_cache(ttl: Duration) -> TtlCache<AnchorCacheKey, Vec<AnchoredBlock>> {
    TtlCache::new(
        ttl,
        NonZeroUsize::new(ANCHOR_CACHE_CAP).expect("ANCHOR_CACHE_CAP is non-zero"),
    )
}

impl ChainStateService {
    pub fn new(store: Arc<dyn ChainStore>) -> Self {
        Self {
            daemons: HashMap::new(),
            store,
            anchor_cache: anchor_cache(ANCHOR_CACHE_TTL),
        }
    }

    /// Register the daemon serving `chain`/`network`.
    pub fn with_daemon(mut self, chain: &str, network: &str, rpc: Arc<dyn NodeRpc>) -> Self {
        self.daemons
            .insert((chain.to_owned(), network.to_ascii_lowercase()), rpc);
        self
    }

    pub fn with_anchor_cache_ttl(mut self, ttl: Duration) -> Self {
        self.anchor_cache = anchor_cache(ttl);
        self
    }

    fn daemon(&self, chain: &str, network: &str) -> Result<&Arc<dyn NodeRpc>, CoreError> {
        self.daemons
            .get(&(chain.to_owned(), network.to_owned()))
            .ok_or_else(|| {
                CoreError::InvalidArgument(format!("no daemon configured for {chain}/{network}"))
            })
    }

    // ==========================================================================
    // Transactions
    // ==========================================================================

    /// Look up a stored transaction and enrich it. `Ok(None)` when the
    /// store has no such transaction.
    pub async fn get_transaction(
        &self,
        chain: &str,
        network: &str,
        txid: &str,
    ) -> Result<Option<EnrichedTransaction>, CoreError> {
        if chain.is_empty() || network.is_empty() || txid.is_empty() {
            return Err(CoreError::InvalidArgument(
                "chain, network and txid are required".to_owned(),
            ));
        }
        Txid::from_str(txid)
            .map_err(|e| CoreError::InvalidArgument(format!("invalid txid {txid}: {e}")))?;
        let network = network.to_ascii_lowercase();
        let rpc = self.daemon(chain, &network)?;

        let tip_height = self.store.local_tip(chain, &network).await?.unwrap_or(0);
        let Some(record) = self.store.find_transaction(chain, &network, txid).await? else {
            debug!(chain, network = %network, txid, "transaction not found");
            return Ok(None);
        };

        Ok(Some(
            enrich_transaction(rpc.as_ref(), &record, tip_height).await,
        ))
    }

    // ==========================================================================
    // Anchors
    // ==========================================================================

    /// Newest active anchors above `since_block`, joined with their stored
    /// blocks. Results are cached per (chain, network, since_block, limit).
    ///
    /// An empty daemon anchor list is [`CoreError::NotFound`]. Nothing is
    /// cached unless the whole view was built.
    pub async fn get_anchored_block(
        &self,
        chain: &str,
        network: &str,
        since_block: Option<u64>,
        limit: Option<usize>,
    ) -> Result<Vec<AnchoredBlock>, CoreError> {
        let network = network.to_ascii_lowercase();
        let key = AnchorCacheKey {
            chain: chain.to_owned(),
            network: network.clone(),
            since_block,
            limit: limit.unwrap_or(DEFAULT_ANCHOR_LIMIT),
        };
        if let Some(cached) = self.anchor_cache.get(&key).await {
            debug!(chain, network = %network, ?since_block, limit = key.limit, "anchor cache hit");
            return Ok(cached);
        }

        info!(chain, network = %network, ?since_block, limit = key.limit, "anchor cache miss");
        let anchors = self.fetch_anchors(chain, &network).await?;
        if anchors.is_empty() {
            return Err(CoreError::NotFound(format!(
                "no anchors reported for {chain}/{network}"
            )));
        }

        let selected = select_anchors(anchors, since_block, key.limit);
        let heights = distinct_heights(&selected);
        let blocks = self
            .store
            .find_blocks_by_heights(chain, &network, &heights)
            .await?;
        let view = join_anchors_with_blocks(selected, blocks)?;

        self.anchor_cache.insert(key, view.clone()).await;
        Ok(view)
    }

    /// Count of active anchors, fetched fresh from the daemon.
    pub async fn get_total_anchored_blocks(
        &self,
        chain: &str,
        network: &str,
    ) -> Result<AnchorTotal, CoreError> {
        let network = network.to_ascii_lowercase();
        let anchors = self.fetch_anchors(chain, &network).await?;
        let total = anchors.iter().filter(|a| a.active).count();
        Ok(AnchorTotal { total })
    }

    async fn fetch_anchors(
        &self,
        chain: &str,
        network: &str,
    ) -> Result<Vec<AnchorEntry>, CoreError> {
        self.daemon(chain, network)?
            .list_anchors(AnchorBounds::default())
            .await
    }
}
