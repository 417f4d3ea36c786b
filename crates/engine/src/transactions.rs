//! Transaction primitives.
//!
//! A `Transaction` records one income or expense of a treasury. Its `status`
//! is the authoritative business lifecycle:
//!
//! ```text
//! pending ──confirm──▶ confirmed
//!    │  ▲
//! reject │ update
//!    ▼  │
//! rejected ──delete──▶ deleted ◀──delete── pending
//! ```
//!
//! Notarization progress lives on the separate
//! [`ChainLog`](crate::ChainLog) and never feeds back into `status`.

use chrono::{DateTime, SubsecRound, Utc};
use ledger::{B256, DetailFacts};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Amount, EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "INCOME",
            Self::Expense => "EXPENSE",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "INCOME" => Ok(Self::Income),
            "EXPENSE" => Ok(Self::Expense),
            _ => Err(EngineError::Validation(format!(
                "invalid transaction type: {value}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Confirmed,
    Rejected,
    Deleted,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Rejected => "rejected",
            Self::Deleted => "deleted",
        }
    }

    /// Only pending and rejected transactions may be edited or deleted.
    pub fn is_editable(self) -> bool {
        matches!(self, Self::Pending | Self::Rejected)
    }
}

impl TryFrom<&str> for TransactionStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim() {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "rejected" => Ok(Self::Rejected),
            "deleted" => Ok(Self::Deleted),
            other => Err(EngineError::Validation(format!(
                "invalid transaction status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub treasury_id: Uuid,
    pub kind: TransactionKind,
    pub amount: Amount,
    pub note: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub status: TransactionStatus,
    pub confirmed_amount: Option<Amount>,
    pub confirmed_by: Option<String>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub reject_reason: Option<String>,
}

impl Transaction {
    pub fn new(
        treasury_id: Uuid,
        kind: TransactionKind,
        amount: Amount,
        note: Option<String>,
        created_by: String,
    ) -> ResultEngine<Self> {
        if !amount.is_positive() {
            return Err(EngineError::Validation("amount must be > 0".to_string()));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            treasury_id,
            kind,
            amount,
            note,
            created_by,
            // Stored timestamps keep microseconds; truncate so the detail
            // hash computed now matches the one recomputed from the row.
            created_at: Utc::now().trunc_subsecs(6),
            status: TransactionStatus::Pending,
            confirmed_amount: None,
            confirmed_by: None,
            confirmed_at: None,
            reject_reason: None,
        })
    }

    /// The amount that counts: confirmed when present, requested otherwise.
    pub fn effective_amount(&self) -> Amount {
        self.confirmed_amount.unwrap_or(self.amount)
    }

    /// Digest of the immutable facts anchored on-chain.
    pub fn detail_hash(&self) -> B256 {
        let id = self.id.to_string();
        let amount = self.effective_amount().to_string();
        ledger::detail_hash(&DetailFacts {
            id: &id,
            kind: self.kind.as_str(),
            amount: &amount,
            note: self.note.as_deref().unwrap_or(""),
            created_at: self.created_at,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub treasury_id: String,
    pub kind: String,
    pub amount_minor: i64,
    pub note: Option<String>,
    pub created_by: String,
    pub created_at: DateTimeUtc,
    pub status: String,
    pub confirmed_amount_minor: Option<i64>,
    pub confirmed_by: Option<String>,
    pub confirmed_at: Option<DateTimeUtc>,
    pub reject_reason: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::treasury::Entity",
        from = "Column::TreasuryId",
        to = "super::treasury::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Treasuries,
    #[sea_orm(has_one = "super::chain_logs::Entity")]
    ChainLog,
}

impl Related<super::treasury::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Treasuries.def()
    }
}

impl Related<super::chain_logs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ChainLog.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            treasury_id: ActiveValue::Set(tx.treasury_id.to_string()),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            amount_minor: ActiveValue::Set(tx.amount.minor()),
            note: ActiveValue::Set(tx.note.clone()),
            created_by: ActiveValue::Set(tx.created_by.clone()),
            created_at: ActiveValue::Set(tx.created_at),
            status: ActiveValue::Set(tx.status.as_str().to_string()),
            confirmed_amount_minor: ActiveValue::Set(tx.confirmed_amount.map(Amount::minor)),
            confirmed_by: ActiveValue::Set(tx.confirmed_by.clone()),
            confirmed_at: ActiveValue::Set(tx.confirmed_at),
            reject_reason: ActiveValue::Set(tx.reject_reason.clone()),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("transaction not exists".to_string()))?,
            treasury_id: Uuid::parse_str(&model.treasury_id)
                .map_err(|_| EngineError::KeyNotFound("treasury not exists".to_string()))?,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            amount: Amount::from_minor(model.amount_minor),
            note: model.note,
            created_by: model.created_by,
            created_at: model.created_at,
            status: TransactionStatus::try_from(model.status.as_str())?,
            confirmed_amount: model.confirmed_amount_minor.map(Amount::from_minor),
            confirmed_by: model.confirmed_by,
            confirmed_at: model.confirmed_at,
            reject_reason: model.reject_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Transaction {
        Transaction::new(
            Uuid::new_v4(),
            TransactionKind::Income,
            Amount::from_minor(10_000_000_000),
            Some("dues".to_string()),
            "alice".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn kind_parsing_is_case_insensitive() {
        assert_eq!(
            TransactionKind::try_from("income").unwrap(),
            TransactionKind::Income
        );
        assert_eq!(
            TransactionKind::try_from("EXPENSE").unwrap(),
            TransactionKind::Expense
        );
        assert!(TransactionKind::try_from("TRANSFER").is_err());
    }

    #[test]
    fn new_rejects_non_positive_amounts() {
        for minor in [0, -1] {
            let err = Transaction::new(
                Uuid::new_v4(),
                TransactionKind::Expense,
                Amount::from_minor(minor),
                None,
                "alice".to_string(),
            )
            .unwrap_err();
            assert!(matches!(err, EngineError::Validation(_)));
        }
    }

    #[test]
    fn new_starts_pending_without_confirmation() {
        let tx = sample();
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert!(tx.confirmed_amount.is_none());
        assert!(tx.confirmed_by.is_none());
        assert!(tx.confirmed_at.is_none());
        assert_eq!(tx.created_at.timestamp_subsec_nanos() % 1_000, 0);
    }

    #[test]
    fn detail_hash_tracks_confirmed_amount_and_note() {
        let tx = sample();
        assert_eq!(tx.detail_hash(), tx.clone().detail_hash());

        let mut confirmed = tx.clone();
        confirmed.confirmed_amount = Some(Amount::from_minor(9_500_000_000));
        assert_ne!(tx.detail_hash(), confirmed.detail_hash());

        let mut renoted = tx.clone();
        renoted.note = Some("dues (march)".to_string());
        assert_ne!(tx.detail_hash(), renoted.detail_hash());
    }
}
