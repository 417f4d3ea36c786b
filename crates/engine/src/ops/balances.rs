use sea_orm::{ConnectionTrait, Statement, TransactionTrait};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Amount, ResultEngine, TransactionKind, TransactionStatus};

use super::{Engine, with_tx};

/// Derived position of a treasury over its confirmed transactions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub total_income: Amount,
    pub total_expense: Amount,
    pub balance: Amount,
}

impl Engine {
    /// Sums confirmed transactions, preferring the confirmed amount.
    /// Notarization status plays no part.
    pub async fn balance(&self, treasury_id: Uuid, actor: &str) -> ResultEngine<Balance> {
        with_tx!(self, |db_tx| {
            self.require_member(&db_tx, treasury_id, actor).await?;

            let backend = self.database.get_database_backend();
            let mut totals = [0_i64; 2];
            for (slot, kind) in [TransactionKind::Income, TransactionKind::Expense]
                .into_iter()
                .enumerate()
            {
                let stmt = Statement::from_sql_and_values(
                    backend,
                    "SELECT COALESCE(SUM(COALESCE(confirmed_amount_minor, amount_minor)), 0) AS sum \
                     FROM transactions \
                     WHERE treasury_id = ? AND status = ? AND kind = ?",
                    vec![
                        treasury_id.to_string().into(),
                        TransactionStatus::Confirmed.as_str().into(),
                        kind.as_str().into(),
                    ],
                );
                let row = db_tx.query_one(stmt).await?;
                totals[slot] = row.and_then(|r| r.try_get("", "sum").ok()).unwrap_or(0);
            }

            let [income, expense] = totals.map(Amount::from_minor);
            Ok(Balance {
                total_income: income,
                total_expense: expense,
                balance: income - expense,
            })
        })
    }
}
