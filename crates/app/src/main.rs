use std::sync::Arc;

use ledger::{ChainLedger, Ledger};
use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "treasury={level},server={level},engine={level},ledger={level}",
            level = settings.app.level
        ))
        .init();

    let db = parse_database(&settings.server.database).await?;

    // Degraded ledger: confirmations still work, chain logs fail until retried.
    let ledger: Arc<dyn Ledger> = match ChainLedger::connect(&settings.ledger).await {
        Ok(ledger) => Arc::new(ledger),
        Err(err) => {
            tracing::warn!("ledger unavailable, notarization disabled: {err}");
            Arc::new(ChainLedger::disabled(err.to_string()))
        }
    };

    let engine = engine::Engine::builder()
        .database(db.clone())
        .ledger(ledger)
        .workers(settings.notarization.workers)
        .build()
        .await?;

    let bind = settings
        .server
        .bind
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let addr = format!("{}:{}", bind, settings.server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    server::run_with_listener(engine, db, listener).await?;

    Ok(())
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
