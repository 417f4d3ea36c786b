//! Transactions API endpoints

use api_types::transaction::{
    TransactionConfirm, TransactionKind as ApiKind, TransactionListQuery,
    TransactionListResponse, TransactionNew, TransactionReject, TransactionStatus as ApiStatus,
    TransactionUpdate, TransactionView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{
    ConfirmCmd, CreateTransactionCmd, RejectCmd, StatusFilter, TransactionEntry,
    UpdateTransactionCmd, users,
};
use uuid::Uuid;

use crate::{ServerError, chain_logs::chain_log_view, parse_amount, server::ServerState};

fn map_kind(kind: engine::TransactionKind) -> ApiKind {
    match kind {
        engine::TransactionKind::Income => ApiKind::Income,
        engine::TransactionKind::Expense => ApiKind::Expense,
    }
}

fn map_status(status: engine::TransactionStatus) -> ApiStatus {
    match status {
        engine::TransactionStatus::Pending => ApiStatus::Pending,
        engine::TransactionStatus::Confirmed => ApiStatus::Confirmed,
        engine::TransactionStatus::Rejected => ApiStatus::Rejected,
        engine::TransactionStatus::Deleted => ApiStatus::Deleted,
    }
}

fn transaction_view(
    transaction: engine::Transaction,
    chain_log: Option<engine::ChainLog>,
) -> TransactionView {
    TransactionView {
        id: transaction.id,
        treasury_id: transaction.treasury_id,
        kind: map_kind(transaction.kind),
        amount: transaction.amount.to_string(),
        note: transaction.note,
        created_by: transaction.created_by,
        created_at: transaction.created_at,
        status: map_status(transaction.status),
        confirmed_amount: transaction.confirmed_amount.map(|a| a.to_string()),
        confirmed_by: transaction.confirmed_by,
        confirmed_at: transaction.confirmed_at,
        reject_reason: transaction.reject_reason,
        chain_log: chain_log.map(chain_log_view),
    }
}

fn entry_view(entry: TransactionEntry) -> TransactionView {
    transaction_view(entry.transaction, entry.chain_log)
}

pub async fn create(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransactionNew>,
) -> Result<(StatusCode, Json<TransactionView>), ServerError> {
    let cmd = CreateTransactionCmd {
        kind: engine::TransactionKind::try_from(payload.kind.as_str())?,
        amount: parse_amount(&payload.amount)?,
        note: payload.note,
    };
    let transaction = state
        .engine
        .create_transaction(id, &user.username, cmd)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(transaction_view(transaction, None)),
    ))
}

pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Query(query): Query<TransactionListQuery>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let raw = query.status.as_deref().unwrap_or("");
    let filter: StatusFilter = raw
        .parse()
        .map_err(|_| ServerError::Generic(format!("invalid status filter: {raw}")))?;

    let transactions = state
        .engine
        .list_transactions(id, &user.username, &filter)
        .await?
        .into_iter()
        .map(entry_view)
        .collect();
    Ok(Json(TransactionListResponse { transactions }))
}

pub async fn get(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path((id, tx_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<TransactionView>, ServerError> {
    let entry = state
        .engine
        .transaction(id, tx_id, &user.username)
        .await?;
    Ok(Json(entry_view(entry)))
}

pub async fn update(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path((id, tx_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<TransactionUpdate>,
) -> Result<Json<TransactionView>, ServerError> {
    let cmd = UpdateTransactionCmd {
        amount: parse_amount(&payload.amount)?,
        note: payload.note,
    };
    let transaction = state
        .engine
        .update_transaction(id, tx_id, &user.username, cmd)
        .await?;
    Ok(Json(transaction_view(transaction, None)))
}

pub async fn remove(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path((id, tx_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_transaction(id, tx_id, &user.username)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Confirms the transaction and returns at once; notarization continues in
/// the background and shows up on the chain log.
pub async fn confirm(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path((id, tx_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<TransactionConfirm>,
) -> Result<Json<TransactionView>, ServerError> {
    let cmd = ConfirmCmd {
        amount: parse_amount(&payload.amount)?,
        note: payload.note,
    };
    state
        .engine
        .confirm_transaction(id, tx_id, &user.username, cmd)
        .await?;
    let entry = state
        .engine
        .transaction(id, tx_id, &user.username)
        .await?;
    Ok(Json(entry_view(entry)))
}

pub async fn reject(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path((id, tx_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<TransactionReject>,
) -> Result<Json<TransactionView>, ServerError> {
    let transaction = state
        .engine
        .reject_transaction(id, tx_id, &user.username, RejectCmd::new(payload.reason))
        .await?;
    Ok(Json(transaction_view(transaction, None)))
}
