//! Treasury memberships and roles.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Admin,
    Treasurer,
    Member,
}

impl MemberRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Treasurer => "treasurer",
            Self::Member => "member",
        }
    }

    /// Admins and treasurers confirm, reject and re-notarize transactions.
    pub fn can_review(self) -> bool {
        matches!(self, Self::Admin | Self::Treasurer)
    }

    pub fn is_admin(self) -> bool {
        self == Self::Admin
    }
}

impl TryFrom<&str> for MemberRole {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "admin" => Ok(Self::Admin),
            "treasurer" => Ok(Self::Treasurer),
            "member" => Ok(Self::Member),
            other => Err(EngineError::Validation(format!(
                "invalid member role: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: Uuid,
    pub treasury_id: Uuid,
    pub username: String,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "members")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub treasury_id: String,
    pub user_id: String,
    pub role: String,
    pub joined_at: DateTimeUtc,
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

impl TryFrom<Model> for Member {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("member not exists".to_string()))?,
            treasury_id: Uuid::parse_str(&model.treasury_id)
                .map_err(|_| EngineError::KeyNotFound("treasury not exists".to_string()))?,
            username: model.user_id,
            role: MemberRole::try_from(model.role.as_str())?,
            joined_at: model.joined_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trip() {
        for role in [MemberRole::Admin, MemberRole::Treasurer, MemberRole::Member] {
            assert_eq!(MemberRole::try_from(role.as_str()).unwrap(), role);
        }
        assert!(MemberRole::try_from("owner").is_err());
    }

    #[test]
    fn only_admin_and_treasurer_review() {
        assert!(MemberRole::Admin.can_review());
        assert!(MemberRole::Treasurer.can_review());
        assert!(!MemberRole::Member.can_review());
    }
}
