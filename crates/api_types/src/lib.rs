//! Wire types of the HTTP API.
//!
//! Amounts travel as decimal strings (`"95.00"` on input, 8 decimals on
//! output) so clients never round through floats.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod treasury {
    use super::*;
    use crate::member::MemberView;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TreasuryNew {
        pub name: String,
        pub description: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TreasuryView {
        pub id: Uuid,
        pub name: String,
        pub description: Option<String>,
        pub created_by: String,
        /// Address that signs the notarization submissions of this treasury.
        pub chain_address: String,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TreasuryListResponse {
        pub treasuries: Vec<TreasuryView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TreasuryDetailResponse {
        pub treasury: TreasuryView,
        pub members: Vec<MemberView>,
    }
}

pub mod member {
    use super::*;

    /// Role of a user in a treasury.
    ///
    /// - `admin`: manages members and bank account, reviews transactions.
    /// - `treasurer`: reviews transactions.
    /// - `member`: submits and reads.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum MemberRole {
        Admin,
        Treasurer,
        #[default]
        Member,
    }

    /// Names the user by `username` or by `email`, exactly one of them.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberNew {
        #[serde(default)]
        pub username: Option<String>,
        #[serde(default)]
        pub email: Option<String>,
        #[serde(default)]
        pub role: MemberRole,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberRoleUpdate {
        pub role: MemberRole,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberView {
        pub id: Uuid,
        pub username: String,
        pub role: MemberRole,
        pub joined_at: DateTime<Utc>,
    }
}

pub mod transaction {
    use super::*;
    use crate::chain_log::ChainLogView;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum TransactionKind {
        Income,
        Expense,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionStatus {
        Pending,
        Confirmed,
        Rejected,
        Deleted,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionNew {
        /// `INCOME` or `EXPENSE`, in any case.
        #[serde(rename = "type")]
        pub kind: String,
        pub amount: String,
        pub note: Option<String>,
    }

    /// Replaces amount and note of a pending or rejected transaction.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionUpdate {
        pub amount: String,
        pub note: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionConfirm {
        /// Amount actually received or paid, may differ from the request.
        pub amount: String,
        pub note: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionReject {
        pub reason: String,
    }

    /// Query of `GET /treasuries/{id}/transactions`.
    ///
    /// `status` is `all` or a comma-separated list; absent hides deleted rows.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionListQuery {
        pub status: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub treasury_id: Uuid,
        #[serde(rename = "type")]
        pub kind: TransactionKind,
        pub amount: String,
        pub note: Option<String>,
        pub created_by: String,
        pub created_at: DateTime<Utc>,
        pub status: TransactionStatus,
        pub confirmed_amount: Option<String>,
        pub confirmed_by: Option<String>,
        pub confirmed_at: Option<DateTime<Utc>>,
        pub reject_reason: Option<String>,
        pub chain_log: Option<ChainLogView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        pub transactions: Vec<TransactionView>,
    }
}

pub mod chain_log {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ChainStatus {
        None,
        Pending,
        Success,
        Failed,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ChainLogView {
        pub id: Uuid,
        pub transaction_id: Uuid,
        pub tx_hash: Option<String>,
        pub detail_hash: Option<String>,
        pub block_number: Option<u64>,
        pub status: ChainStatus,
        pub error_detail: Option<String>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

pub mod balance {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceView {
        pub total_income: String,
        pub total_expense: String,
        pub balance: String,
    }
}

pub mod bank_account {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BankAccountUpsert {
        pub bank_name: String,
        pub account_number: String,
        pub account_name: String,
        pub qr_code_url: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BankAccountView {
        pub id: Uuid,
        pub treasury_id: Uuid,
        pub bank_name: String,
        pub account_number: String,
        pub account_name: String,
        pub qr_code_url: Option<String>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

pub mod report {
    use super::*;

    /// `?year=`; the server defaults to the current year.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct YearQuery {
        pub year: Option<i32>,
    }

    /// `?limit=`; the server defaults to 10.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct LimitQuery {
        pub limit: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct IncomeByMemberView {
        pub username: String,
        /// `YYYY-MM`
        pub month: String,
        pub total: String,
        pub count: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MonthlyExpenseView {
        pub month: String,
        pub total: String,
        pub count: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct YearlySummaryView {
        pub year: i32,
        pub total_income: String,
        pub total_expense: String,
        pub balance: String,
        pub income_count: i64,
        pub expense_count: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TopContributorView {
        pub username: String,
        pub total_income: String,
        pub count: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReportResponse<T> {
        pub rows: Vec<T>,
    }
}
