use axum::extract::{Path, State};
use axum::Json;

use chainlens_core::types::EnrichedTransaction;

use super::error::{map_core_error, AppError};
use super::SharedState;

pub(super) async fn get_transaction(
    State(state): State<SharedState>,
    Path((chain, network, txid)): Path<(String, String, String)>,
) -> Result<Json<EnrichedTransaction>, AppError> {
    let found = state
        .service
        .get_transaction(&chain, &network, &txid)
        .await
        .map_err(|e| map_core_error("transaction lookup", e))?;

    found
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("transaction not found: {txid}")))
}
