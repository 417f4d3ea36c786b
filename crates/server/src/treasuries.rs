//! Treasury endpoints.

use api_types::{
    balance::BalanceView,
    treasury::{TreasuryDetailResponse, TreasuryListResponse, TreasuryNew, TreasuryView},
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::users;
use uuid::Uuid;

use crate::{ServerError, members::member_view, server::ServerState};

fn treasury_view(treasury: engine::Treasury) -> TreasuryView {
    TreasuryView {
        id: treasury.id,
        name: treasury.name,
        description: treasury.description,
        created_by: treasury.created_by,
        chain_address: treasury.chain_address,
        created_at: treasury.created_at,
    }
}

pub async fn create(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<TreasuryNew>,
) -> Result<(StatusCode, Json<TreasuryView>), ServerError> {
    let treasury = state
        .engine
        .create_treasury(&user.username, &payload.name, payload.description.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(treasury_view(treasury))))
}

pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
) -> Result<Json<TreasuryListResponse>, ServerError> {
    let treasuries = state
        .engine
        .list_treasuries(&user.username)
        .await?
        .into_iter()
        .map(treasury_view)
        .collect();
    Ok(Json(TreasuryListResponse { treasuries }))
}

pub async fn get(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TreasuryDetailResponse>, ServerError> {
    let detail = state.engine.treasury(id, &user.username).await?;
    Ok(Json(TreasuryDetailResponse {
        treasury: treasury_view(detail.treasury),
        members: detail.members.into_iter().map(member_view).collect(),
    }))
}

pub async fn balance(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BalanceView>, ServerError> {
    let balance = state.engine.balance(id, &user.username).await?;
    Ok(Json(BalanceView {
        total_income: balance.total_income.to_string(),
        total_expense: balance.total_expense.to_string(),
        balance: balance.balance.to_string(),
    }))
}
