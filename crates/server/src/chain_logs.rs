//! Notarization status endpoints.

use api_types::chain_log::{ChainLogView, ChainStatus};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::users;
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

pub(crate) fn chain_log_view(log: engine::ChainLog) -> ChainLogView {
    ChainLogView {
        id: log.id,
        transaction_id: log.transaction_id,
        tx_hash: log.tx_hash,
        detail_hash: log.detail_hash,
        block_number: log.block_number,
        status: match log.status {
            engine::ChainStatus::None => ChainStatus::None,
            engine::ChainStatus::Pending => ChainStatus::Pending,
            engine::ChainStatus::Success => ChainStatus::Success,
            engine::ChainStatus::Failed => ChainStatus::Failed,
        },
        error_detail: log.error_detail,
        created_at: log.created_at,
        updated_at: log.updated_at,
    }
}

pub async fn get(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path((id, tx_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ChainLogView>, ServerError> {
    let log = state.engine.chain_log(id, tx_id, &user.username).await?;
    Ok(Json(chain_log_view(log)))
}

/// Re-queues a failed notarization. Answers 202: the submission itself runs
/// in the background.
pub async fn retry(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path((id, tx_id)): Path<(Uuid, Uuid)>,
) -> Result<(StatusCode, Json<ChainLogView>), ServerError> {
    let log = state
        .engine
        .retry_notarization(id, tx_id, &user.username)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(chain_log_view(log))))
}

pub async fn refresh(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path((id, tx_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ChainLogView>, ServerError> {
    let log = state
        .engine
        .refresh_chain_receipt(id, tx_id, &user.username)
        .await?;
    Ok(Json(chain_log_view(log)))
}
