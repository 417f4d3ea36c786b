use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};
use sea_orm::{DatabaseConnection, EntityTrait};

use std::sync::Arc;

use crate::{bank_accounts, chain_logs, members, reports, transactions, treasuries};
use engine::{Engine, users};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
}

/// Resolves the Basic credentials to a user and stores it as a request
/// extension for the handlers.
async fn auth(
    auth_header: Option<TypedHeader<Authorization<Basic>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(TypedHeader(auth_header)) = auth_header else {
        return Err(StatusCode::UNAUTHORIZED);
    };
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let user = users::Entity::find_by_id(auth_header.username().to_string())
        .one(&state.db)
        .await
        .map_err(|err| {
            tracing::error!("failed to load user: {err}");
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .filter(|user| user.password == auth_header.password())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

async fn health() -> &'static str {
    "ok"
}

pub fn router(state: ServerState) -> Router {
    let api = Router::new()
        .route(
            "/treasuries",
            post(treasuries::create).get(treasuries::list),
        )
        .route("/treasuries/{id}", get(treasuries::get))
        .route("/treasuries/{id}/balance", get(treasuries::balance))
        .route("/treasuries/{id}/members", post(members::add))
        .route(
            "/treasuries/{id}/members/{member_id}",
            axum::routing::put(members::update_role).delete(members::remove),
        )
        .route(
            "/treasuries/{id}/bank-account",
            get(bank_accounts::get)
                .put(bank_accounts::upsert)
                .delete(bank_accounts::remove),
        )
        .route(
            "/treasuries/{id}/transactions",
            post(transactions::create).get(transactions::list),
        )
        .route(
            "/treasuries/{id}/transactions/{tx_id}",
            get(transactions::get)
                .put(transactions::update)
                .delete(transactions::remove),
        )
        .route(
            "/treasuries/{id}/transactions/{tx_id}/confirm",
            post(transactions::confirm),
        )
        .route(
            "/treasuries/{id}/transactions/{tx_id}/reject",
            post(transactions::reject),
        )
        .route(
            "/treasuries/{id}/transactions/{tx_id}/chain-log",
            get(chain_logs::get),
        )
        .route(
            "/treasuries/{id}/transactions/{tx_id}/chain-log/retry",
            post(chain_logs::retry),
        )
        .route(
            "/treasuries/{id}/transactions/{tx_id}/chain-log/refresh",
            post(chain_logs::refresh),
        )
        .route(
            "/treasuries/{id}/reports/income-by-member",
            get(reports::income_by_member),
        )
        .route(
            "/treasuries/{id}/reports/monthly-expense",
            get(reports::monthly_expense),
        )
        .route(
            "/treasuries/{id}/reports/yearly-summary",
            get(reports::yearly_summary),
        )
        .route(
            "/treasuries/{id}/reports/top-contributors",
            get(reports::top_contributors),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth));

    Router::new()
        .route("/health", get(health))
        .merge(api)
        .with_state(state)
}

pub async fn run_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        db,
    };

    axum::serve(listener, router(state)).await
}
