//! Read-only aggregates over confirmed transactions.
//!
//! Months and years are cut from the stored RFC 3339 `created_at` text, so
//! they are UTC calendar periods.

use sea_orm::{ConnectionTrait, QueryResult, Statement, TransactionTrait, Value};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Amount, EngineError, ResultEngine, TransactionKind, TransactionStatus};

use super::{Engine, with_tx};

const EFFECTIVE_AMOUNT: &str = "COALESCE(confirmed_amount_minor, amount_minor)";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeByMemberRow {
    pub username: String,
    /// `YYYY-MM`
    pub month: String,
    pub total: Amount,
    pub count: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyExpenseRow {
    pub month: String,
    pub total: Amount,
    pub count: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearlySummaryRow {
    pub year: i32,
    pub total_income: Amount,
    pub total_expense: Amount,
    pub balance: Amount,
    pub income_count: i64,
    pub expense_count: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopContributorRow {
    pub username: String,
    pub total_income: Amount,
    pub count: i64,
}

fn amount(row: &QueryResult, column: &str) -> ResultEngine<Amount> {
    let minor: Option<i64> = row.try_get("", column)?;
    Ok(Amount::from_minor(minor.unwrap_or(0)))
}

impl Engine {
    async fn report_rows(
        &self,
        treasury_id: Uuid,
        actor: &str,
        sql: String,
        values: Vec<Value>,
    ) -> ResultEngine<Vec<QueryResult>> {
        with_tx!(self, |db_tx| {
            self.require_member(&db_tx, treasury_id, actor).await?;
            let stmt =
                Statement::from_sql_and_values(self.database.get_database_backend(), sql, values);
            db_tx.query_all(stmt).await.map_err(EngineError::from)
        })
    }

    /// Confirmed income per member and month of `year`, newest month first.
    pub async fn income_by_member(
        &self,
        treasury_id: Uuid,
        actor: &str,
        year: i32,
    ) -> ResultEngine<Vec<IncomeByMemberRow>> {
        let sql = format!(
            "SELECT created_by AS username, substr(created_at, 1, 7) AS month, \
                    SUM({EFFECTIVE_AMOUNT}) AS total, COUNT(*) AS count \
             FROM transactions \
             WHERE treasury_id = ? AND status = ? AND kind = ? AND substr(created_at, 1, 4) = ? \
             GROUP BY created_by, month \
             ORDER BY month DESC, username ASC"
        );
        let rows = self
            .report_rows(
                treasury_id,
                actor,
                sql,
                vec![
                    treasury_id.to_string().into(),
                    TransactionStatus::Confirmed.as_str().into(),
                    TransactionKind::Income.as_str().into(),
                    format!("{year:04}").into(),
                ],
            )
            .await?;

        rows.iter()
            .map(|row| -> ResultEngine<IncomeByMemberRow> {
                Ok(IncomeByMemberRow {
                    username: row.try_get("", "username")?,
                    month: row.try_get("", "month")?,
                    total: amount(row, "total")?,
                    count: row.try_get("", "count")?,
                })
            })
            .collect()
    }

    /// Confirmed expenses per month of `year`, newest month first.
    pub async fn monthly_expense(
        &self,
        treasury_id: Uuid,
        actor: &str,
        year: i32,
    ) -> ResultEngine<Vec<MonthlyExpenseRow>> {
        let sql = format!(
            "SELECT substr(created_at, 1, 7) AS month, \
                    SUM({EFFECTIVE_AMOUNT}) AS total, COUNT(*) AS count \
             FROM transactions \
             WHERE treasury_id = ? AND status = ? AND kind = ? AND substr(created_at, 1, 4) = ? \
             GROUP BY month \
             ORDER BY month DESC"
        );
        let rows = self
            .report_rows(
                treasury_id,
                actor,
                sql,
                vec![
                    treasury_id.to_string().into(),
                    TransactionStatus::Confirmed.as_str().into(),
                    TransactionKind::Expense.as_str().into(),
                    format!("{year:04}").into(),
                ],
            )
            .await?;

        rows.iter()
            .map(|row| -> ResultEngine<MonthlyExpenseRow> {
                Ok(MonthlyExpenseRow {
                    month: row.try_get("", "month")?,
                    total: amount(row, "total")?,
                    count: row.try_get("", "count")?,
                })
            })
            .collect()
    }

    /// Income, expense and balance per year, newest first.
    pub async fn yearly_summary(
        &self,
        treasury_id: Uuid,
        actor: &str,
    ) -> ResultEngine<Vec<YearlySummaryRow>> {
        let sql = format!(
            "SELECT substr(created_at, 1, 4) AS year, \
                    SUM(CASE WHEN kind = ? THEN {EFFECTIVE_AMOUNT} ELSE 0 END) AS total_income, \
                    SUM(CASE WHEN kind = ? THEN {EFFECTIVE_AMOUNT} ELSE 0 END) AS total_expense, \
                    SUM(CASE WHEN kind = ? THEN 1 ELSE 0 END) AS income_count, \
                    SUM(CASE WHEN kind = ? THEN 1 ELSE 0 END) AS expense_count \
             FROM transactions \
             WHERE treasury_id = ? AND status = ? \
             GROUP BY year \
             ORDER BY year DESC"
        );
        let income = TransactionKind::Income.as_str();
        let expense = TransactionKind::Expense.as_str();
        let rows = self
            .report_rows(
                treasury_id,
                actor,
                sql,
                vec![
                    income.into(),
                    expense.into(),
                    income.into(),
                    expense.into(),
                    treasury_id.to_string().into(),
                    TransactionStatus::Confirmed.as_str().into(),
                ],
            )
            .await?;

        rows.iter()
            .map(|row| -> ResultEngine<YearlySummaryRow> {
                let year: String = row.try_get("", "year")?;
                let year = year
                    .parse()
                    .map_err(|_| EngineError::Validation(format!("invalid year: {year}")))?;
                let total_income = amount(row, "total_income")?;
                let total_expense = amount(row, "total_expense")?;
                Ok(YearlySummaryRow {
                    year,
                    total_income,
                    total_expense,
                    balance: total_income - total_expense,
                    income_count: row.try_get("", "income_count")?,
                    expense_count: row.try_get("", "expense_count")?,
                })
            })
            .collect()
    }

    /// Members ranked by confirmed income, largest first.
    pub async fn top_contributors(
        &self,
        treasury_id: Uuid,
        actor: &str,
        limit: u64,
    ) -> ResultEngine<Vec<TopContributorRow>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let sql = format!(
            "SELECT created_by AS username, SUM({EFFECTIVE_AMOUNT}) AS total_income, \
                    COUNT(*) AS count \
             FROM transactions \
             WHERE treasury_id = ? AND status = ? AND kind = ? \
             GROUP BY created_by \
             ORDER BY total_income DESC, username ASC \
             LIMIT ?"
        );
        let rows = self
            .report_rows(
                treasury_id,
                actor,
                sql,
                vec![
                    treasury_id.to_string().into(),
                    TransactionStatus::Confirmed.as_str().into(),
                    TransactionKind::Income.as_str().into(),
                    limit.into(),
                ],
            )
            .await?;

        rows.iter()
            .map(|row| -> ResultEngine<TopContributorRow> {
                Ok(TopContributorRow {
                    username: row.try_get("", "username")?,
                    total_income: amount(row, "total_income")?,
                    count: row.try_get("", "count")?,
                })
            })
            .collect()
    }
}
