//! Hand-off, retry and operator maintenance of notarizations.
//!
//! A chain log enters `pending` only through a claim, a conditional
//! update that succeeds for exactly one caller and bumps the log's attempt
//! number. Whoever wins the claim owns that attempt and is the only one
//! allowed to schedule it.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    ChainLog, ChainStatus, EngineError, NotarizationJob, ResultEngine, Transaction,
    TransactionStatus, chain_logs, transactions, treasury,
};

use super::{Engine, normalize_required_text, with_tx};

impl Engine {
    /// Moves a chain log to `pending` if it is currently in one of `from`.
    /// Returns the attempt number the caller now owns.
    async fn claim<C: ConnectionTrait>(
        &self,
        db: &C,
        chain_log_id: Uuid,
        from: &[ChainStatus],
    ) -> ResultEngine<i32> {
        let log = chain_logs::Entity::find_by_id(chain_log_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("chain log not exists".to_string()))?;
        let attempt = log.attempt + 1;

        let result = chain_logs::Entity::update_many()
            .col_expr(
                chain_logs::Column::Status,
                Expr::value(ChainStatus::Pending.as_str()),
            )
            .col_expr(chain_logs::Column::Attempt, Expr::value(attempt))
            .col_expr(chain_logs::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(chain_logs::Column::Id.eq(chain_log_id.to_string()))
            .filter(chain_logs::Column::Status.is_in(from.iter().map(|s| s.as_str())))
            .filter(chain_logs::Column::Attempt.eq(log.attempt))
            .exec(db)
            .await?;
        if result.rows_affected != 1 {
            return Err(EngineError::InvalidState(
                "notarization is already in progress or completed".to_string(),
            ));
        }
        Ok(attempt)
    }

    /// Conditionally moves a `pending` chain log to `failed`. With an
    /// attempt, only that attempt is released.
    async fn release<C: ConnectionTrait>(
        &self,
        db: &C,
        chain_log_id: Uuid,
        attempt: Option<i32>,
        error_detail: String,
    ) -> ResultEngine<()> {
        let mut update = chain_logs::Entity::update_many()
            .col_expr(
                chain_logs::Column::Status,
                Expr::value(ChainStatus::Failed.as_str()),
            )
            .col_expr(chain_logs::Column::ErrorDetail, Expr::value(Some(error_detail)))
            .col_expr(chain_logs::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(chain_logs::Column::Id.eq(chain_log_id.to_string()))
            .filter(chain_logs::Column::Status.eq(ChainStatus::Pending.as_str()));
        if let Some(attempt) = attempt {
            update = update.filter(chain_logs::Column::Attempt.eq(attempt));
        }
        let result = update.exec(db).await?;
        if result.rows_affected != 1 {
            return Err(EngineError::InvalidState(
                "notarization is not pending".to_string(),
            ));
        }
        Ok(())
    }

    /// Claims the fresh log of a just-confirmed transaction and schedules it.
    /// Failures are logged; the confirmation already stands.
    pub(super) async fn hand_off(
        &self,
        transaction: Transaction,
        chain_log_id: Uuid,
        treasury_address: String,
    ) {
        let transaction_id = transaction.id;
        let attempt = match self
            .claim(&self.database, chain_log_id, &[ChainStatus::None])
            .await
        {
            Ok(attempt) => attempt,
            Err(err) => {
                tracing::warn!(
                    transaction_id = %transaction_id,
                    error = %err,
                    "Could not claim notarization after confirm"
                );
                return;
            }
        };

        let job = NotarizationJob {
            transaction,
            chain_log_id,
            attempt,
            treasury_address,
        };
        if let Err(err) = self.scheduler.schedule(job) {
            tracing::warn!(
                transaction_id = %transaction_id,
                error = %err,
                "Notarization not scheduled, left for operator retry"
            );
            if let Err(err) = self
                .release(&self.database, chain_log_id, Some(attempt), err.to_string())
                .await
            {
                tracing::warn!(
                    transaction_id = %transaction_id,
                    error = %err,
                    "Could not release notarization claim"
                );
            }
        }
    }

    /// Claims the notarization of a confirmed transaction for a new attempt.
    ///
    /// Succeeds only from `none` or `failed`. The returned job must be run,
    /// either through the scheduler or inline with [`Engine::notarizer`].
    pub async fn claim_notarization(&self, transaction_id: Uuid) -> ResultEngine<NotarizationJob> {
        let (transaction, chain_log_id, treasury_address) = with_tx!(self, |db_tx| {
            let model = transactions::Entity::find_by_id(transaction_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))?;
            let transaction = Transaction::try_from(model)?;
            if transaction.status != TransactionStatus::Confirmed {
                return Err(EngineError::InvalidState(
                    "only confirmed transactions can be notarized".to_string(),
                ));
            }
            let log = self.find_chain_log(&db_tx, transaction_id).await?;
            let chain_log_id = Uuid::parse_str(&log.id)
                .map_err(|_| EngineError::KeyNotFound("chain log not exists".to_string()))?;
            let treasury = treasury::Entity::find_by_id(transaction.treasury_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("treasury not exists".to_string()))?;
            Ok::<_, EngineError>((transaction, chain_log_id, treasury.chain_address))
        })?;

        let attempt = self
            .claim(
                &self.database,
                chain_log_id,
                &[ChainStatus::None, ChainStatus::Failed],
            )
            .await?;
        tracing::info!(transaction_id = %transaction_id, attempt, "Notarization claimed");

        Ok(NotarizationJob {
            transaction,
            chain_log_id,
            attempt,
            treasury_address,
        })
    }

    /// Re-submits the notarization of a confirmed transaction whose chain log
    /// is `none` or `failed`. Returns the log, now `pending`.
    pub async fn retry_notarization(
        &self,
        treasury_id: Uuid,
        transaction_id: Uuid,
        actor: &str,
    ) -> ResultEngine<ChainLog> {
        with_tx!(self, |db_tx| {
            self.require_reviewer(&db_tx, treasury_id, actor).await?;
            self.find_transaction(&db_tx, treasury_id, transaction_id)
                .await?;
            Ok::<_, EngineError>(())
        })?;

        let job = self.claim_notarization(transaction_id).await?;
        let (chain_log_id, attempt) = (job.chain_log_id, job.attempt);
        if let Err(err) = self.scheduler.schedule(job) {
            tracing::warn!(
                transaction_id = %transaction_id,
                error = %err,
                "Notarization retry not scheduled"
            );
            self.release(&self.database, chain_log_id, Some(attempt), err.to_string())
                .await?;
            return Err(err);
        }

        let log = self.find_chain_log(&self.database, transaction_id).await?;
        ChainLog::try_from(log)
    }

    pub async fn chain_log(
        &self,
        treasury_id: Uuid,
        transaction_id: Uuid,
        actor: &str,
    ) -> ResultEngine<ChainLog> {
        with_tx!(self, |db_tx| {
            self.require_member(&db_tx, treasury_id, actor).await?;
            self.find_transaction(&db_tx, treasury_id, transaction_id)
                .await?;
            let log = self.find_chain_log(&db_tx, transaction_id).await?;
            ChainLog::try_from(log)
        })
    }

    /// Looks up the block of a successful notarization and stores it.
    pub async fn refresh_chain_receipt(
        &self,
        treasury_id: Uuid,
        transaction_id: Uuid,
        actor: &str,
    ) -> ResultEngine<ChainLog> {
        let log = with_tx!(self, |db_tx| {
            self.require_reviewer(&db_tx, treasury_id, actor).await?;
            self.find_transaction(&db_tx, treasury_id, transaction_id)
                .await?;
            let log = self.find_chain_log(&db_tx, transaction_id).await?;
            ChainLog::try_from(log)
        })?;

        let tx_hash = match (&log.status, &log.tx_hash) {
            (ChainStatus::Success, Some(tx_hash)) => tx_hash.clone(),
            _ => {
                return Err(EngineError::InvalidState(
                    "notarization has not succeeded".to_string(),
                ));
            }
        };

        let Some(block_number) = self.ledger.block_number(&tx_hash).await? else {
            tracing::debug!(transaction_id = %transaction_id, tx_hash = %tx_hash, "Receipt not mined yet");
            return Ok(log);
        };
        let block_number = i64::try_from(block_number)
            .map_err(|_| EngineError::Validation("block number out of range".to_string()))?;

        let model = chain_logs::ActiveModel {
            id: ActiveValue::Set(log.id.to_string()),
            block_number: ActiveValue::Set(Some(block_number)),
            updated_at: ActiveValue::Set(Utc::now()),
            ..Default::default()
        }
        .update(&self.database)
        .await?;
        tracing::info!(transaction_id = %transaction_id, block_number, "Receipt refreshed");
        ChainLog::try_from(model)
    }

    /// Chain logs in any of `statuses`, oldest first. Logs whose transaction
    /// no longer exists are included.
    pub async fn chain_logs_by_status(
        &self,
        statuses: &[ChainStatus],
    ) -> ResultEngine<Vec<ChainLog>> {
        chain_logs::Entity::find()
            .filter(chain_logs::Column::Status.is_in(statuses.iter().map(|s| s.as_str())))
            .order_by_asc(chain_logs::Column::CreatedAt)
            .all(&self.database)
            .await?
            .into_iter()
            .map(ChainLog::try_from)
            .collect()
    }

    /// Marks a notarization stranded in `pending` as `failed` so it can be
    /// retried. A task still running the released attempt can no longer
    /// write its outcome.
    pub async fn release_stuck_notarization(
        &self,
        transaction_id: Uuid,
        reason: &str,
    ) -> ResultEngine<ChainLog> {
        let reason = normalize_required_text(reason, "release reason")?;
        let log = self.find_chain_log(&self.database, transaction_id).await?;
        let chain_log_id = Uuid::parse_str(&log.id)
            .map_err(|_| EngineError::KeyNotFound("chain log not exists".to_string()))?;

        self.release(&self.database, chain_log_id, None, reason)
            .await?;
        tracing::warn!(transaction_id = %transaction_id, "Stuck notarization released");

        let log = self.find_chain_log(&self.database, transaction_id).await?;
        ChainLog::try_from(log)
    }
}
