//! Notarization records.
//!
//! One `ChainLog` per confirmed transaction. It is created in `none` together
//! with the confirmation and afterwards only moves among `pending`, `success`
//! and `failed`. Entering `pending` always goes through a claim (see
//! `Engine::claim_notarization`), which bumps `attempt`. Only the task holding
//! the current attempt may write the outcome.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainStatus {
    None,
    Pending,
    Success,
    Failed,
}

impl ChainStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

impl TryFrom<&str> for ChainStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim() {
            "none" => Ok(Self::None),
            "pending" => Ok(Self::Pending),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            other => Err(EngineError::Validation(format!(
                "invalid chain status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainLog {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub tx_hash: Option<String>,
    pub detail_hash: Option<String>,
    pub block_number: Option<u64>,
    pub status: ChainStatus,
    pub attempt: i32,
    pub error_detail: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChainLog {
    pub(crate) fn new(transaction_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            transaction_id,
            tx_hash: None,
            detail_hash: None,
            block_number: None,
            status: ChainStatus::None,
            attempt: 0,
            error_detail: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "chain_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub transaction_id: String,
    pub tx_hash: Option<String>,
    pub detail_hash: Option<String>,
    pub block_number: Option<i64>,
    pub status: String,
    pub attempt: i32,
    pub error_detail: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::transactions::Entity",
        from = "Column::TransactionId",
        to = "super::transactions::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Transactions,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&ChainLog> for ActiveModel {
    fn from(log: &ChainLog) -> Self {
        use sea_orm::ActiveValue::Set;

        Self {
            id: Set(log.id.to_string()),
            transaction_id: Set(log.transaction_id.to_string()),
            tx_hash: Set(log.tx_hash.clone()),
            detail_hash: Set(log.detail_hash.clone()),
            block_number: Set(log.block_number.and_then(|n| i64::try_from(n).ok())),
            status: Set(log.status.as_str().to_string()),
            attempt: Set(log.attempt),
            error_detail: Set(log.error_detail.clone()),
            created_at: Set(log.created_at),
            updated_at: Set(log.updated_at),
        }
    }
}

impl TryFrom<Model> for ChainLog {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("chain log not exists".to_string()))?,
            transaction_id: Uuid::parse_str(&model.transaction_id)
                .map_err(|_| EngineError::KeyNotFound("transaction not exists".to_string()))?,
            tx_hash: model.tx_hash,
            detail_hash: model.detail_hash,
            block_number: model.block_number.and_then(|n| u64::try_from(n).ok()),
            status: ChainStatus::try_from(model.status.as_str())?,
            attempt: model.attempt,
            error_detail: model.error_detail,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_strings_round_trip() {
        for status in [
            ChainStatus::None,
            ChainStatus::Pending,
            ChainStatus::Success,
            ChainStatus::Failed,
        ] {
            assert_eq!(ChainStatus::try_from(status.as_str()).unwrap(), status);
        }
        assert!(ChainStatus::try_from("mined").is_err());
    }

    #[test]
    fn new_log_starts_unclaimed() {
        let log = ChainLog::new(Uuid::new_v4(), Utc::now());
        assert_eq!(log.status, ChainStatus::None);
        assert_eq!(log.attempt, 0);
        assert!(log.tx_hash.is_none());
        assert!(log.detail_hash.is_none());
        assert_eq!(log.created_at, log.updated_at);
    }
}
