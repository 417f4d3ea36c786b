use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::{Amount, EngineError};

use serde::Serialize;
pub use server::{ServerState, router, run_with_listener};

mod bank_accounts;
mod chain_logs;
mod members;
mod reports;
mod server;
mod transactions;
mod treasuries;

pub mod types {
    pub use api_types::{balance, bank_account, chain_log, member, report, transaction, treasury};
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::InvalidState(_) | EngineError::ExistingKey(_) => StatusCode::CONFLICT,
        EngineError::Ledger(_) => StatusCode::BAD_GATEWAY,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::Ledger(ledger_err) => {
            tracing::warn!("ledger error: {ledger_err}");
            ledger_err.to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), message_for_engine_error(err)),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

/// Parses a decimal amount from a request body.
///
/// Malformed text is a bad request, not an engine validation error: the
/// engine only sees well-formed amounts.
fn parse_amount(raw: &str) -> Result<Amount, ServerError> {
    raw.parse()
        .map_err(|_| ServerError::Generic(format!("invalid amount: {raw}")))
}
