//! Transaction enrichment: confirmation counting and custom payload decoding.
//!
//! Turns a stored [`TransactionRecord`] into the [`EnrichedTransaction`]
//! served to API callers. The stored record is never modified; decoding
//! always works on the projection.

use futures::future::join;
use tracing::warn;

use crate::custom::{decode_custom_tx, CustomTx, TokenBalance, TxType};
use crate::error::CoreError;
use crate::rpc::NodeRpc;
use crate::types::{EnrichedTransaction, TransactionRecord};

// ==============================================================================
// Confirmations
// ==============================================================================

/// Confirmations of a transaction at `block_height` given the local tip.
///
/// Unconfirmed transactions (no height, or a negative one) have 0. A stale
/// tip below the transaction height yields a non-positive count; it is
/// reported as computed.
#[must_use]
pub fn confirmations(tip_height: u64, block_height: Option<i64>) -> i64 {
    match block_height {
        Some(height) if height >= 0 => {
            i64::try_from(tip_height).unwrap_or(i64::MAX) - height + 1
        }
        _ => 0,
    }
}

// ==============================================================================
// Enrichment
// ==============================================================================

/// Attach confirmations, the applied flag and a decoded custom payload.
///
/// For a confirmed custom transaction with a payload, the applied check
/// and the decode run concurrently. Neither failure fails the enrichment: an applied-check
/// failure reports `false`, a decode failure keeps the stored payload and
/// sets `decode_error`.
pub async fn enrich_transaction<R>(
    rpc: &R,
    record: &TransactionRecord,
    tip_height: u64,
) -> EnrichedTransaction
where
    R: NodeRpc + ?Sized,
{
    let mut tx = record.to_api();
    let confirmations = confirmations(tip_height, record.block_height);

    let height = match record.confirmed_height() {
        Some(height) if record.is_custom && record.custom_data.is_some() => height,
        _ => {
            return EnrichedTransaction {
                tx,
                confirmations,
                is_custom_tx_applied: false,
                decode_error: None,
            };
        }
    };

    let (applied, decoded) = join(
        rpc.is_applied_custom_tx(&record.txid, height),
        decode_payload(rpc, record),
    )
    .await;

    let is_custom_tx_applied = applied.unwrap_or_else(|e| {
        warn!(txid = %record.txid, height, error = %e, "applied check failed");
        false
    });

    let mut decode_error = None;
    match decoded {
        Ok(Some(value)) => tx.custom_data = Some(value),
        Ok(None) => {}
        Err(e) => {
            warn!(txid = %record.txid, error = %e, "custom payload decode failed");
            decode_error = Some(e.to_string());
        }
    }

    EnrichedTransaction {
        tx,
        confirmations,
        is_custom_tx_applied,
        decode_error,
    }
}

/// Decode the record's payload, or `None` when its type carries no
/// decodable balances.
async fn decode_payload<R>(
    rpc: &R,
    record: &TransactionRecord,
) -> Result<Option<serde_json::Value>, CoreError>
where
    R: NodeRpc + ?Sized,
{
    let Some(tx_type) = record.tx_type.as_deref().and_then(TxType::from_code) else {
        return Ok(None);
    };
    let Some(payload) = record.custom_data.as_ref() else {
        return Ok(None);
    };

    let raw = CustomTx::<TokenBalance>::parse(tx_type, payload).map_err(|e| {
        CoreError::Decode {
            txid: record.txid.clone(),
            message: e.to_string(),
        }
    })?;
    let decoded = decode_custom_tx(rpc, &record.txid, raw).await?;
    decoded.into_value().map(Some)
}
