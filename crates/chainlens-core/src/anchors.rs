//! Anchor selection and the anchor/block join behind the anchored-block view.

use std::collections::HashMap;

use crate::error::CoreError;
use crate::rpc::AnchorEntry;
use crate::types::{AnchoredBlock, BlockRecord};

/// Pick the newest active anchors above a lower bound.
///
/// Entries are ordered by `defi_block_height` descending (stable for equal
/// heights). The lower bound is `since_block` when given, otherwise one
/// below the oldest anchor in the list. Entries strictly above the bound
/// and active are kept, at most `limit` of them.
pub fn select_anchors(
    mut anchors: Vec<AnchorEntry>,
    since_block: Option<u64>,
    limit: usize,
) -> Vec<AnchorEntry> {
    anchors.sort_by(|a, b| b.defi_block_height.cmp(&a.defi_block_height));

    let Some(oldest) = anchors.last().map(|a| a.defi_block_height) else {
        return anchors;
    };
    // i128 so that `oldest - 1` stays below a height-0 anchor.
    let lower_bound = since_block.map_or(i128::from(oldest) - 1, i128::from);

    anchors
        .into_iter()
        .filter(|a| i128::from(a.defi_block_height) > lower_bound && a.active)
        .take(limit)
        .collect()
}

/// Distinct heights of `anchors`, in first-seen order.
pub fn distinct_heights(anchors: &[AnchorEntry]) -> Vec<u64> {
    let mut heights = Vec::with_capacity(anchors.len());
    for anchor in anchors {
        if !heights.contains(&anchor.defi_block_height) {
            heights.push(anchor.defi_block_height);
        }
    }
    heights
}

/// Left-join anchors with the stored blocks at their heights.
///
/// Each result starts from the anchor's fields, is overlaid with the
/// matching block's fields, and then takes `btcTxHash` from the anchor
/// (removed when the anchor has none). Anchors without a stored block keep
/// only their own fields. Order follows `anchors`.
pub fn join_anchors_with_blocks(
    anchors: Vec<AnchorEntry>,
    blocks: Vec<BlockRecord>,
) -> Result<Vec<AnchoredBlock>, CoreError> {
    let mut by_height = HashMap::with_capacity(blocks.len());
    for block in blocks {
        by_height.insert(block.height, block);
    }

    anchors
        .into_iter()
        .map(|anchor| {
            let btc_tx_hash = anchor.btc_tx_hash.clone();
            let mut fields = to_object(&anchor)?;
            if let Some(block) = by_height.get(&anchor.defi_block_height) {
                fields.extend(to_object(block)?);
            }
            match btc_tx_hash {
                Some(hash) => {
                    fields.insert("btcTxHash".to_owned(), serde_json::Value::String(hash));
                }
                None => {
                    fields.remove("btcTxHash");
                }
            }
            Ok(AnchoredBlock(fields))
        })
        .collect()
}

fn to_object<T: serde::Serialize>(
    value: &T,
) -> Result<serde_json::Map<String, serde_json::Value>, CoreError> {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::Object(fields)) => Ok(fields),
        Ok(other) => Err(CoreError::InvalidData(format!(
            "expected a JSON object, got {other}"
        ))),
        Err(e) => Err(CoreError::InvalidData(format!("serialize anchor view: {e}"))),
    }
}
