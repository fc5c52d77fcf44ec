use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use chainlens_core::types::{AnchorTotal, AnchoredBlock};

use super::error::{map_core_error, AppError};
use super::SharedState;

#[derive(Deserialize)]
pub(super) struct AnchorQuery {
    since: Option<u64>,
    limit: Option<usize>,
}

pub(super) async fn get_anchored_blocks(
    State(state): State<SharedState>,
    Path((chain, network)): Path<(String, String)>,
    Query(query): Query<AnchorQuery>,
) -> Result<Json<Vec<AnchoredBlock>>, AppError> {
    state
        .service
        .get_anchored_block(&chain, &network, query.since, query.limit)
        .await
        .map(Json)
        .map_err(|e| map_core_error("anchored block view", e))
}

pub(super) async fn get_total_anchored_blocks(
    State(state): State<SharedState>,
    Path((chain, network)): Path<(String, String)>,
) -> Result<Json<AnchorTotal>, AppError> {
    state
        .service
        .get_total_anchored_blocks(&chain, &network)
        .await
        .map(Json)
        .map_err(|e| map_core_error("anchor total", e))
}
