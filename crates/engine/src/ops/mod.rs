use std::sync::Arc;

use ledger::Ledger;
use sea_orm::DatabaseConnection;

use crate::{
    EngineError, NotarizationQueue, NotarizationScheduler, Notarizer, ResultEngine,
};

mod access;
mod balances;
mod bank_accounts;
mod members;
mod notarization;
mod reports;
mod transactions;
mod treasuries;

pub use balances::Balance;
pub use reports::{IncomeByMemberRow, MonthlyExpenseRow, TopContributorRow, YearlySummaryRow};
pub use transactions::{StatusFilter, TransactionEntry};
pub use treasuries::TreasuryDetail;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

const DEFAULT_WORKERS: usize = 4;

pub struct Engine {
    database: DatabaseConnection,
    ledger: Arc<dyn Ledger>,
    scheduler: Arc<dyn NotarizationScheduler>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// A notarizer sharing the engine's database and ledger, for running a
    /// claimed job inline.
    pub fn notarizer(&self) -> Notarizer {
        Notarizer::new(self.database.clone(), Arc::clone(&self.ledger))
    }
}

fn normalize_required_text(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(format!("{label} must not be empty")));
    }
    Ok(trimmed.to_string())
}

fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    ledger: Option<Arc<dyn Ledger>>,
    scheduler: Option<Arc<dyn NotarizationScheduler>>,
    workers: Option<usize>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Pass the required ledger client
    pub fn ledger(mut self, ledger: Arc<dyn Ledger>) -> EngineBuilder {
        self.ledger = Some(ledger);
        self
    }

    /// Replace the background notarization queue.
    pub fn scheduler(mut self, scheduler: Arc<dyn NotarizationScheduler>) -> EngineBuilder {
        self.scheduler = Some(scheduler);
        self
    }

    /// Maximum number of notarizations running at once.
    pub fn workers(mut self, workers: usize) -> EngineBuilder {
        self.workers = Some(workers);
        self
    }

    /// Construct `Engine`
    ///
    /// Without an explicit scheduler a [`NotarizationQueue`] is created and
    /// its worker spawned on the current tokio runtime.
    pub async fn build(self) -> ResultEngine<Engine> {
        let ledger = self
            .ledger
            .ok_or_else(|| EngineError::Validation("ledger client is required".to_string()))?;

        let scheduler = match self.scheduler {
            Some(scheduler) => scheduler,
            None => {
                let notarizer = Notarizer::new(self.database.clone(), Arc::clone(&ledger));
                let workers = self.workers.unwrap_or(DEFAULT_WORKERS);
                let (queue, worker) = NotarizationQueue::new(notarizer, workers);
                tokio::spawn(worker.run());
                tracing::debug!(workers, "Notarization worker started");
                Arc::new(queue) as Arc<dyn NotarizationScheduler>
            }
        };

        Ok(Engine {
            database: self.database,
            ledger,
            scheduler,
        })
    }
}
