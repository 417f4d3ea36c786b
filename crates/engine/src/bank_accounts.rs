//! Bank account metadata shown to members paying into a treasury.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankAccount {
    pub id: Uuid,
    pub treasury_id: Uuid,
    pub bank_name: String,
    pub account_number: String,
    pub account_name: String,
    pub qr_code_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "bank_accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub treasury_id: String,
    pub bank_name: String,
    pub account_number: String,
    pub account_name: String,
    pub qr_code_url: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
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
}

impl Related<super::treasury::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Treasuries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for BankAccount {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("bank account not exists".to_string()))?,
            treasury_id: Uuid::parse_str(&model.treasury_id)
                .map_err(|_| EngineError::KeyNotFound("treasury not exists".to_string()))?,
            bank_name: model.bank_name,
            account_number: model.account_number,
            account_name: model.account_name,
            qr_code_url: model.qr_code_url,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
