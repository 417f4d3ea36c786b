use api_types::bank_account::{BankAccountUpsert, BankAccountView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{BankAccountCmd, users};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

fn bank_account_view(account: engine::BankAccount) -> BankAccountView {
    BankAccountView {
        id: account.id,
        treasury_id: account.treasury_id,
        bank_name: account.bank_name,
        account_number: account.account_number,
        account_name: account.account_name,
        qr_code_url: account.qr_code_url,
        created_at: account.created_at,
        updated_at: account.updated_at,
    }
}

pub async fn get(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BankAccountView>, ServerError> {
    let account = state.engine.bank_account(id, &user.username).await?;
    Ok(Json(bank_account_view(account)))
}

pub async fn upsert(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<BankAccountUpsert>,
) -> Result<Json<BankAccountView>, ServerError> {
    let mut cmd = BankAccountCmd::new(
        payload.bank_name,
        payload.account_number,
        payload.account_name,
    );
    if let Some(url) = payload.qr_code_url {
        cmd = cmd.qr_code_url(url);
    }
    let account = state
        .engine
        .upsert_bank_account(id, &user.username, cmd)
        .await?;
    Ok(Json(bank_account_view(account)))
}

pub async fn remove(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_bank_account(id, &user.username)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
