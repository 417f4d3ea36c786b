use sea_orm::{ConnectionTrait, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{EngineError, MemberRole, ResultEngine, chain_logs, members, transactions, treasury, users};

use super::Engine;

impl Engine {
    pub(super) async fn require_user_exists<C: ConnectionTrait>(
        &self,
        db: &C,
        username: &str,
    ) -> ResultEngine<()> {
        users::Entity::find_by_id(username.to_string())
            .one(db)
            .await?
            .map(|_| ())
            .ok_or_else(|| EngineError::KeyNotFound(format!("user {username} not exists")))
    }

    pub(super) async fn find_treasury<C: ConnectionTrait>(
        &self,
        db: &C,
        treasury_id: Uuid,
    ) -> ResultEngine<treasury::Model> {
        treasury::Entity::find_by_id(treasury_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("treasury not exists".to_string()))
    }

    pub(super) async fn find_membership<C: ConnectionTrait>(
        &self,
        db: &C,
        treasury_id: Uuid,
        username: &str,
    ) -> ResultEngine<Option<members::Model>> {
        members::Entity::find()
            .filter(members::Column::TreasuryId.eq(treasury_id.to_string()))
            .filter(members::Column::UserId.eq(username))
            .one(db)
            .await
            .map_err(Into::into)
    }

    /// Resolves the actor's role. The treasury must exist (`KeyNotFound`) and
    /// the actor must belong to it (`Forbidden`).
    pub(super) async fn require_member<C: ConnectionTrait>(
        &self,
        db: &C,
        treasury_id: Uuid,
        actor: &str,
    ) -> ResultEngine<MemberRole> {
        self.find_treasury(db, treasury_id).await?;
        let membership = self
            .find_membership(db, treasury_id, actor)
            .await?
            .ok_or_else(|| {
                EngineError::Forbidden("not a member of this treasury".to_string())
            })?;
        MemberRole::try_from(membership.role.as_str())
    }

    pub(super) async fn require_reviewer<C: ConnectionTrait>(
        &self,
        db: &C,
        treasury_id: Uuid,
        actor: &str,
    ) -> ResultEngine<MemberRole> {
        let role = self.require_member(db, treasury_id, actor).await?;
        if !role.can_review() {
            return Err(EngineError::Forbidden(
                "only treasurers and admins can review transactions".to_string(),
            ));
        }
        Ok(role)
    }

    pub(super) async fn require_admin<C: ConnectionTrait>(
        &self,
        db: &C,
        treasury_id: Uuid,
        actor: &str,
    ) -> ResultEngine<()> {
        let role = self.require_member(db, treasury_id, actor).await?;
        if !role.is_admin() {
            return Err(EngineError::Forbidden(
                "only admins can manage this treasury".to_string(),
            ));
        }
        Ok(())
    }

    /// A transaction of another treasury is reported as missing.
    pub(super) async fn find_transaction<C: ConnectionTrait>(
        &self,
        db: &C,
        treasury_id: Uuid,
        transaction_id: Uuid,
    ) -> ResultEngine<transactions::Model> {
        transactions::Entity::find_by_id(transaction_id.to_string())
            .filter(transactions::Column::TreasuryId.eq(treasury_id.to_string()))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))
    }

    pub(super) async fn find_chain_log<C: ConnectionTrait>(
        &self,
        db: &C,
        transaction_id: Uuid,
    ) -> ResultEngine<chain_logs::Model> {
        chain_logs::Entity::find()
            .filter(chain_logs::Column::TransactionId.eq(transaction_id.to_string()))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("chain log not exists".to_string()))
    }
}
