//! Background notarization.
//!
//! The engine hands a [`NotarizationJob`] to a [`NotarizationScheduler`]
//! after it has claimed the job's chain log. The production scheduler is a
//! [`NotarizationQueue`] drained by a [`NotarizationWorker`], which runs every
//! job on its own tokio task through a [`Notarizer`].

use std::sync::Arc;

use chrono::Utc;
use ledger::{Ledger, hex_hash};
use sea_orm::{
    DatabaseConnection, EntityTrait, QueryFilter,
    prelude::*,
    sea_query::{Expr, SimpleExpr},
};
use tokio::sync::{Semaphore, mpsc};
use uuid::Uuid;

use crate::{ChainLog, ChainStatus, EngineError, ResultEngine, Transaction, chain_logs};

/// Everything the background task needs, captured when the job is claimed.
#[derive(Clone, Debug)]
pub struct NotarizationJob {
    pub transaction: Transaction,
    pub chain_log_id: Uuid,
    /// Attempt number won by the claim. Writes for any other attempt are
    /// discarded.
    pub attempt: i32,
    pub treasury_address: String,
}

/// Accepts claimed jobs. Implementations must not block the caller.
pub trait NotarizationScheduler: Send + Sync {
    fn schedule(&self, job: NotarizationJob) -> ResultEngine<()>;
}

/// Executes one notarization attempt against the ledger.
///
/// Ledger failures are recorded on the chain log and never returned; only
/// database errors surface to the caller. A job whose attempt was released
/// or re-claimed in the meantime leaves the log untouched, and returns it
/// as it currently stands.
#[derive(Clone)]
pub struct Notarizer {
    database: DatabaseConnection,
    ledger: Arc<dyn Ledger>,
}

impl Notarizer {
    pub fn new(database: DatabaseConnection, ledger: Arc<dyn Ledger>) -> Self {
        Self { database, ledger }
    }

    pub async fn run(&self, job: NotarizationJob) -> ResultEngine<ChainLog> {
        let transaction_id = job.transaction.id;

        // a superseded job must not reach the ledger
        if !self.record(&job, Vec::new()).await? {
            return self.superseded(&job).await;
        }

        let detail_hash = job.transaction.detail_hash();
        let outcome = self
            .ledger
            .submit(&job.treasury_address, detail_hash)
            .await;

        let values = match outcome {
            Ok(submission) => {
                tracing::info!(
                    transaction_id = %transaction_id,
                    tx_hash = %submission.tx_hash,
                    detail_hash = %submission.detail_hash,
                    "Transaction notarized"
                );
                vec![
                    (
                        chain_logs::Column::Status,
                        Expr::value(ChainStatus::Success.as_str()),
                    ),
                    (
                        chain_logs::Column::TxHash,
                        Expr::value(Some(submission.tx_hash)),
                    ),
                    (
                        chain_logs::Column::DetailHash,
                        Expr::value(Some(submission.detail_hash)),
                    ),
                    (chain_logs::Column::ErrorDetail, Expr::value(None::<String>)),
                ]
            }
            Err(err) => {
                tracing::warn!(
                    transaction_id = %transaction_id,
                    detail_hash = %hex_hash(detail_hash),
                    error = %err,
                    "Notarization failed"
                );
                vec![
                    (
                        chain_logs::Column::Status,
                        Expr::value(ChainStatus::Failed.as_str()),
                    ),
                    (
                        chain_logs::Column::ErrorDetail,
                        Expr::value(Some(err.to_string())),
                    ),
                ]
            }
        };

        if !self.record(&job, values).await? {
            return self.superseded(&job).await;
        }
        self.current(&job).await
    }

    /// Writes `values` only while the log is `pending` under the job's
    /// attempt. Returns whether the row was written.
    async fn record(
        &self,
        job: &NotarizationJob,
        values: Vec<(chain_logs::Column, SimpleExpr)>,
    ) -> ResultEngine<bool> {
        let mut update = chain_logs::Entity::update_many()
            .col_expr(chain_logs::Column::UpdatedAt, Expr::value(Utc::now()));
        for (column, value) in values {
            update = update.col_expr(column, value);
        }
        let result = update
            .filter(chain_logs::Column::Id.eq(job.chain_log_id.to_string()))
            .filter(chain_logs::Column::Status.eq(ChainStatus::Pending.as_str()))
            .filter(chain_logs::Column::Attempt.eq(job.attempt))
            .exec(&self.database)
            .await?;
        Ok(result.rows_affected == 1)
    }

    async fn superseded(&self, job: &NotarizationJob) -> ResultEngine<ChainLog> {
        tracing::warn!(
            transaction_id = %job.transaction.id,
            attempt = job.attempt,
            "Notarization attempt superseded, outcome discarded"
        );
        self.current(job).await
    }

    async fn current(&self, job: &NotarizationJob) -> ResultEngine<ChainLog> {
        let model = chain_logs::Entity::find_by_id(job.chain_log_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("chain log not exists".to_string()))?;
        ChainLog::try_from(model)
    }
}

/// Sending half of the notarization channel.
#[derive(Clone)]
pub struct NotarizationQueue {
    sender: mpsc::UnboundedSender<NotarizationJob>,
}

impl NotarizationQueue {
    /// Creates the queue and the worker that drains it. The worker does
    /// nothing until [`NotarizationWorker::run`] is spawned.
    pub fn new(notarizer: Notarizer, workers: usize) -> (Self, NotarizationWorker) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let worker = NotarizationWorker {
            receiver,
            notarizer: Arc::new(notarizer),
            permits: Arc::new(Semaphore::new(workers.max(1))),
        };
        (Self { sender }, worker)
    }
}

impl NotarizationScheduler for NotarizationQueue {
    fn schedule(&self, job: NotarizationJob) -> ResultEngine<()> {
        let transaction_id = job.transaction.id;
        self.sender.send(job).map_err(|_| {
            EngineError::InvalidState("notarization worker is not running".to_string())
        })?;
        tracing::info!(transaction_id = %transaction_id, "Notarization scheduled");
        Ok(())
    }
}

pub struct NotarizationWorker {
    receiver: mpsc::UnboundedReceiver<NotarizationJob>,
    notarizer: Arc<Notarizer>,
    permits: Arc<Semaphore>,
}

impl NotarizationWorker {
    /// Drains the queue until every sender is dropped.
    pub async fn run(mut self) {
        while let Some(job) = self.receiver.recv().await {
            let Ok(permit) = Arc::clone(&self.permits).acquire_owned().await else {
                break;
            };
            let notarizer = Arc::clone(&self.notarizer);
            tokio::spawn(async move {
                let _permit = permit;
                let transaction_id = job.transaction.id;
                if let Err(err) = notarizer.run(job).await {
                    tracing::error!(
                        transaction_id = %transaction_id,
                        error = %err,
                        "Notarization could not be recorded"
                    );
                }
            });
        }
        tracing::debug!("Notarization worker stopped");
    }
}
