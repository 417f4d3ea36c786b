use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, JoinType, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait, prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Member, MemberRole, ResultEngine, Treasury, members, treasury};

use super::{Engine, normalize_optional_text, normalize_required_text, with_tx};

/// A treasury with its members, as shown to one of them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasuryDetail {
    pub treasury: Treasury,
    pub members: Vec<Member>,
}

impl Engine {
    /// Creates a treasury owned by `actor`, who joins it as admin.
    ///
    /// The on-chain address is generated by the ledger; its key is not kept.
    pub async fn create_treasury(
        &self,
        actor: &str,
        name: &str,
        description: Option<&str>,
    ) -> ResultEngine<Treasury> {
        let name = normalize_required_text(name, "treasury name")?;
        let description = normalize_optional_text(description);
        let chain_address = self.ledger.generate_address()?;

        let treasury = with_tx!(self, |db_tx| {
            self.require_user_exists(&db_tx, actor).await?;

            let now = Utc::now();
            let treasury = Treasury {
                id: Uuid::new_v4(),
                name,
                description,
                created_by: actor.to_string(),
                chain_address,
                created_at: now,
            };
            treasury::ActiveModel {
                id: ActiveValue::Set(treasury.id.to_string()),
                name: ActiveValue::Set(treasury.name.clone()),
                description: ActiveValue::Set(treasury.description.clone()),
                created_by: ActiveValue::Set(treasury.created_by.clone()),
                chain_address: ActiveValue::Set(treasury.chain_address.clone()),
                created_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;

            members::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4().to_string()),
                treasury_id: ActiveValue::Set(treasury.id.to_string()),
                user_id: ActiveValue::Set(actor.to_string()),
                role: ActiveValue::Set(MemberRole::Admin.as_str().to_string()),
                joined_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;

            Ok::<_, EngineError>(treasury)
        })?;

        tracing::info!(
            treasury_id = %treasury.id,
            chain_address = %treasury.chain_address,
            created_by = actor,
            "Treasury created"
        );
        Ok(treasury)
    }

    /// Treasuries `actor` belongs to, ordered by name.
    pub async fn list_treasuries(&self, actor: &str) -> ResultEngine<Vec<Treasury>> {
        with_tx!(self, |db_tx| {
            let models = treasury::Entity::find()
                .join(JoinType::InnerJoin, treasury::Relation::Members.def())
                .filter(members::Column::UserId.eq(actor))
                .order_by_asc(treasury::Column::Name)
                .all(&db_tx)
                .await?;
            models
                .into_iter()
                .map(Treasury::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    pub async fn treasury(&self, treasury_id: Uuid, actor: &str) -> ResultEngine<TreasuryDetail> {
        with_tx!(self, |db_tx| {
            self.require_member(&db_tx, treasury_id, actor).await?;
            let model = self.find_treasury(&db_tx, treasury_id).await?;
            let members = members::Entity::find()
                .filter(members::Column::TreasuryId.eq(treasury_id.to_string()))
                .order_by_asc(members::Column::JoinedAt)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Member::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;
            Ok::<_, EngineError>(TreasuryDetail {
                treasury: Treasury::try_from(model)?,
                members,
            })
        })
    }
}
