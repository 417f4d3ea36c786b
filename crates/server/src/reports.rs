//! Reports over confirmed transactions.

use api_types::report::{
    IncomeByMemberView, LimitQuery, MonthlyExpenseView, ReportResponse, TopContributorView,
    YearQuery, YearlySummaryView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use chrono::{Datelike, Utc};
use engine::users;
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

const DEFAULT_TOP_CONTRIBUTORS: u64 = 10;

fn year_or_current(query: &YearQuery) -> i32 {
    query.year.unwrap_or_else(|| Utc::now().year())
}

pub async fn income_by_member(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Query(query): Query<YearQuery>,
) -> Result<Json<ReportResponse<IncomeByMemberView>>, ServerError> {
    let rows = state
        .engine
        .income_by_member(id, &user.username, year_or_current(&query))
        .await?
        .into_iter()
        .map(|row| IncomeByMemberView {
            username: row.username,
            month: row.month,
            total: row.total.to_string(),
            count: row.count,
        })
        .collect();
    Ok(Json(ReportResponse { rows }))
}

pub async fn monthly_expense(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Query(query): Query<YearQuery>,
) -> Result<Json<ReportResponse<MonthlyExpenseView>>, ServerError> {
    let rows = state
        .engine
        .monthly_expense(id, &user.username, year_or_current(&query))
        .await?
        .into_iter()
        .map(|row| MonthlyExpenseView {
            month: row.month,
            total: row.total.to_string(),
            count: row.count,
        })
        .collect();
    Ok(Json(ReportResponse { rows }))
}

pub async fn yearly_summary(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReportResponse<YearlySummaryView>>, ServerError> {
    let rows = state
        .engine
        .yearly_summary(id, &user.username)
        .await?
        .into_iter()
        .map(|row| YearlySummaryView {
            year: row.year,
            total_income: row.total_income.to_string(),
            total_expense: row.total_expense.to_string(),
            balance: row.balance.to_string(),
            income_count: row.income_count,
            expense_count: row.expense_count,
        })
        .collect();
    Ok(Json(ReportResponse { rows }))
}

pub async fn top_contributors(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ReportResponse<TopContributorView>>, ServerError> {
    let limit = query.limit.unwrap_or(DEFAULT_TOP_CONTRIBUTORS);
    let rows = state
        .engine
        .top_contributors(id, &user.username, limit)
        .await?
        .into_iter()
        .map(|row| TopContributorView {
            username: row.username,
            total_income: row.total_income.to_string(),
            count: row.count,
        })
        .collect();
    Ok(Json(ReportResponse { rows }))
}
