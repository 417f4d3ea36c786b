use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue, TransactionTrait};
use uuid::Uuid;

use crate::{
    ChainLog, ConfirmCmd, CreateTransactionCmd, EngineError, RejectCmd, ResultEngine, Transaction,
    TransactionStatus, UpdateTransactionCmd, chain_logs, transactions,
};

use super::super::{Engine, normalize_optional_text, normalize_required_text, with_tx};
use super::transition;

impl Engine {
    /// Records a new `pending` transaction on behalf of a treasury member.
    pub async fn create_transaction(
        &self,
        treasury_id: Uuid,
        actor: &str,
        cmd: CreateTransactionCmd,
    ) -> ResultEngine<Transaction> {
        let note = normalize_optional_text(cmd.note.as_deref());
        let transaction = with_tx!(self, |db_tx| {
            self.require_member(&db_tx, treasury_id, actor).await?;
            let transaction =
                Transaction::new(treasury_id, cmd.kind, cmd.amount, note, actor.to_string())?;
            transactions::ActiveModel::from(&transaction)
                .insert(&db_tx)
                .await?;
            Ok::<_, EngineError>(transaction)
        })?;

        tracing::info!(
            treasury_id = %treasury_id,
            transaction_id = %transaction.id,
            kind = transaction.kind.as_str(),
            amount = %transaction.amount,
            "Transaction created"
        );
        Ok(transaction)
    }

    /// Confirms a pending transaction and opens its chain log.
    ///
    /// The confirmation and the `none` chain log commit together. The
    /// notarization is handed off afterwards and its outcome never changes
    /// the returned transaction.
    pub async fn confirm_transaction(
        &self,
        treasury_id: Uuid,
        transaction_id: Uuid,
        actor: &str,
        cmd: ConfirmCmd,
    ) -> ResultEngine<Transaction> {
        if !cmd.amount.is_positive() {
            return Err(EngineError::Validation(
                "confirmed amount must be > 0".to_string(),
            ));
        }
        let note = normalize_optional_text(cmd.note.as_deref());

        let (transaction, chain_log, treasury_address) = with_tx!(self, |db_tx| {
            self.require_reviewer(&db_tx, treasury_id, actor).await?;
            let model = self
                .find_transaction(&db_tx, treasury_id, transaction_id)
                .await?;
            if TransactionStatus::try_from(model.status.as_str())? != TransactionStatus::Pending {
                return Err(EngineError::InvalidState(
                    "only pending transactions can be confirmed".to_string(),
                ));
            }
            let treasury = self.find_treasury(&db_tx, treasury_id).await?;

            let now = Utc::now();
            let mut changes = transactions::ActiveModel {
                status: ActiveValue::Set(TransactionStatus::Confirmed.as_str().to_string()),
                confirmed_amount_minor: ActiveValue::Set(Some(cmd.amount.minor())),
                confirmed_by: ActiveValue::Set(Some(actor.to_string())),
                confirmed_at: ActiveValue::Set(Some(now)),
                ..Default::default()
            };
            if let Some(note) = note {
                changes.note = ActiveValue::Set(Some(note));
            }
            let updated = transition(
                &db_tx,
                &model.id,
                &[TransactionStatus::Pending],
                changes,
            )
            .await?;

            let chain_log = ChainLog::new(transaction_id, now);
            chain_logs::ActiveModel::from(&chain_log)
                .insert(&db_tx)
                .await?;

            Ok::<_, EngineError>((
                Transaction::try_from(updated)?,
                chain_log,
                treasury.chain_address,
            ))
        })?;

        tracing::info!(
            treasury_id = %treasury_id,
            transaction_id = %transaction_id,
            confirmed_by = actor,
            amount = %transaction.effective_amount(),
            "Transaction confirmed"
        );

        self.hand_off(transaction.clone(), chain_log.id, treasury_address)
            .await;
        Ok(transaction)
    }

    pub async fn reject_transaction(
        &self,
        treasury_id: Uuid,
        transaction_id: Uuid,
        actor: &str,
        cmd: RejectCmd,
    ) -> ResultEngine<Transaction> {
        let reason = normalize_required_text(&cmd.reason, "reject reason")?;

        let transaction = with_tx!(self, |db_tx| {
            self.require_reviewer(&db_tx, treasury_id, actor).await?;
            let model = self
                .find_transaction(&db_tx, treasury_id, transaction_id)
                .await?;
            if TransactionStatus::try_from(model.status.as_str())? != TransactionStatus::Pending {
                return Err(EngineError::InvalidState(
                    "only pending transactions can be rejected".to_string(),
                ));
            }

            let changes = transactions::ActiveModel {
                status: ActiveValue::Set(TransactionStatus::Rejected.as_str().to_string()),
                reject_reason: ActiveValue::Set(Some(reason)),
                ..Default::default()
            };
            let updated = transition(
                &db_tx,
                &model.id,
                &[TransactionStatus::Pending],
                changes,
            )
            .await?;
            Transaction::try_from(updated)
        })?;

        tracing::info!(
            treasury_id = %treasury_id,
            transaction_id = %transaction_id,
            rejected_by = actor,
            "Transaction rejected"
        );
        Ok(transaction)
    }

    /// Edits a pending or rejected transaction. A rejected one goes back to
    /// `pending` and loses its reject reason.
    pub async fn update_transaction(
        &self,
        treasury_id: Uuid,
        transaction_id: Uuid,
        actor: &str,
        cmd: UpdateTransactionCmd,
    ) -> ResultEngine<Transaction> {
        if !cmd.amount.is_positive() {
            return Err(EngineError::Validation("amount must be > 0".to_string()));
        }
        let note = normalize_optional_text(cmd.note.as_deref());

        with_tx!(self, |db_tx| {
            self.require_member(&db_tx, treasury_id, actor).await?;
            let model = self
                .find_transaction(&db_tx, treasury_id, transaction_id)
                .await?;
            if model.created_by != actor {
                return Err(EngineError::Forbidden(
                    "only the creator can update this transaction".to_string(),
                ));
            }
            let status = TransactionStatus::try_from(model.status.as_str())?;
            if !status.is_editable() {
                return Err(EngineError::InvalidState(
                    "only pending or rejected transactions can be updated".to_string(),
                ));
            }

            let mut changes = transactions::ActiveModel {
                amount_minor: ActiveValue::Set(cmd.amount.minor()),
                note: ActiveValue::Set(note),
                ..Default::default()
            };
            if status == TransactionStatus::Rejected {
                changes.status = ActiveValue::Set(TransactionStatus::Pending.as_str().to_string());
                changes.reject_reason = ActiveValue::Set(None);
            }
            let updated = transition(&db_tx, &model.id, &[status], changes).await?;
            Transaction::try_from(updated)
        })
    }

    /// Soft-deletes a pending or rejected transaction. Its chain log, if any,
    /// is left alone.
    pub async fn delete_transaction(
        &self,
        treasury_id: Uuid,
        transaction_id: Uuid,
        actor: &str,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let role = self.require_member(&db_tx, treasury_id, actor).await?;
            let model = self
                .find_transaction(&db_tx, treasury_id, transaction_id)
                .await?;
            if model.created_by != actor && !role.is_admin() {
                return Err(EngineError::Forbidden(
                    "only the creator or an admin can delete this transaction".to_string(),
                ));
            }
            let status = TransactionStatus::try_from(model.status.as_str())?;
            if !status.is_editable() {
                return Err(EngineError::InvalidState(format!(
                    "cannot delete a {} transaction",
                    status.as_str()
                )));
            }

            let changes = transactions::ActiveModel {
                status: ActiveValue::Set(TransactionStatus::Deleted.as_str().to_string()),
                ..Default::default()
            };
            transition(&db_tx, &model.id, &[status], changes).await?;
            Ok::<_, EngineError>(())
        })?;

        tracing::info!(
            treasury_id = %treasury_id,
            transaction_id = %transaction_id,
            deleted_by = actor,
            "Transaction deleted"
        );
        Ok(())
    }
}
