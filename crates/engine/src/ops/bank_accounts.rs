use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{BankAccount, BankAccountCmd, EngineError, ResultEngine, bank_accounts};

use super::{Engine, normalize_optional_text, normalize_required_text, with_tx};

impl Engine {
    pub async fn bank_account(&self, treasury_id: Uuid, actor: &str) -> ResultEngine<BankAccount> {
        with_tx!(self, |db_tx| {
            self.require_member(&db_tx, treasury_id, actor).await?;
            let model = bank_accounts::Entity::find()
                .filter(bank_accounts::Column::TreasuryId.eq(treasury_id.to_string()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("bank account not exists".to_string()))?;
            BankAccount::try_from(model)
        })
    }

    /// Creates or replaces the bank account of a treasury (admin-only).
    pub async fn upsert_bank_account(
        &self,
        treasury_id: Uuid,
        actor: &str,
        cmd: BankAccountCmd,
    ) -> ResultEngine<BankAccount> {
        let bank_name = normalize_required_text(&cmd.bank_name, "bank name")?;
        let account_number = normalize_required_text(&cmd.account_number, "account number")?;
        let account_name = normalize_required_text(&cmd.account_name, "account name")?;
        let qr_code_url = normalize_optional_text(cmd.qr_code_url.as_deref());

        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, treasury_id, actor).await?;
            let existing = bank_accounts::Entity::find()
                .filter(bank_accounts::Column::TreasuryId.eq(treasury_id.to_string()))
                .one(&db_tx)
                .await?;

            let now = Utc::now();
            let model = match existing {
                Some(existing) => {
                    bank_accounts::ActiveModel {
                        id: ActiveValue::Set(existing.id),
                        bank_name: ActiveValue::Set(bank_name),
                        account_number: ActiveValue::Set(account_number),
                        account_name: ActiveValue::Set(account_name),
                        qr_code_url: ActiveValue::Set(qr_code_url),
                        updated_at: ActiveValue::Set(now),
                        ..Default::default()
                    }
                    .update(&db_tx)
                    .await?
                }
                None => {
                    bank_accounts::ActiveModel {
                        id: ActiveValue::Set(Uuid::new_v4().to_string()),
                        treasury_id: ActiveValue::Set(treasury_id.to_string()),
                        bank_name: ActiveValue::Set(bank_name),
                        account_number: ActiveValue::Set(account_number),
                        account_name: ActiveValue::Set(account_name),
                        qr_code_url: ActiveValue::Set(qr_code_url),
                        created_at: ActiveValue::Set(now),
                        updated_at: ActiveValue::Set(now),
                    }
                    .insert(&db_tx)
                    .await?
                }
            };
            BankAccount::try_from(model)
        })
    }

    pub async fn delete_bank_account(&self, treasury_id: Uuid, actor: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, treasury_id, actor).await?;
            let result = bank_accounts::Entity::delete_many()
                .filter(bank_accounts::Column::TreasuryId.eq(treasury_id.to_string()))
                .exec(&db_tx)
                .await?;
            if result.rows_affected == 0 {
                return Err(EngineError::KeyNotFound(
                    "bank account not exists".to_string(),
                ));
            }
            Ok(())
        })
    }
}
