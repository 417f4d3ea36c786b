use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ConnectionTrait, PaginatorTrait, QueryFilter, TransactionTrait,
    prelude::*,
};
use uuid::Uuid;

use crate::{EngineError, Member, MemberRole, ResultEngine, members, users};

use super::{Engine, with_tx};

impl Engine {
    async fn find_member<C: ConnectionTrait>(
        &self,
        db: &C,
        treasury_id: Uuid,
        member_id: Uuid,
    ) -> ResultEngine<members::Model> {
        members::Entity::find_by_id(member_id.to_string())
            .filter(members::Column::TreasuryId.eq(treasury_id.to_string()))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("member not exists".to_string()))
    }

    /// Refuses to leave a treasury without admins.
    async fn ensure_other_admin<C: ConnectionTrait>(
        &self,
        db: &C,
        treasury_id: Uuid,
    ) -> ResultEngine<()> {
        let admins = members::Entity::find()
            .filter(members::Column::TreasuryId.eq(treasury_id.to_string()))
            .filter(members::Column::Role.eq(MemberRole::Admin.as_str()))
            .count(db)
            .await?;
        if admins <= 1 {
            return Err(EngineError::InvalidState(
                "a treasury must keep at least one admin".to_string(),
            ));
        }
        Ok(())
    }

    /// Adds an existing user to a treasury (admin-only).
    pub async fn add_member(
        &self,
        treasury_id: Uuid,
        actor: &str,
        username: &str,
        role: MemberRole,
    ) -> ResultEngine<Member> {
        let username = username.trim();
        let member = with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, treasury_id, actor).await?;
            self.require_user_exists(&db_tx, username).await?;
            if self
                .find_membership(&db_tx, treasury_id, username)
                .await?
                .is_some()
            {
                return Err(EngineError::ExistingKey(username.to_string()));
            }

            let model = members::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4().to_string()),
                treasury_id: ActiveValue::Set(treasury_id.to_string()),
                user_id: ActiveValue::Set(username.to_string()),
                role: ActiveValue::Set(role.as_str().to_string()),
                joined_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;
            Member::try_from(model)
        })?;

        tracing::info!(
            treasury_id = %treasury_id,
            username = %member.username,
            role = role.as_str(),
            "Member added"
        );
        Ok(member)
    }

    /// Adds the user registered under `email` (admin-only).
    pub async fn add_member_by_email(
        &self,
        treasury_id: Uuid,
        actor: &str,
        email: &str,
        role: MemberRole,
    ) -> ResultEngine<Member> {
        let email = email.trim();
        let username = with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, treasury_id, actor).await?;
            let user = users::Entity::find()
                .filter(users::Column::Email.eq(email))
                .one(&db_tx)
                .await?
                .ok_or_else(|| {
                    EngineError::KeyNotFound(format!("user with email {email} not exists"))
                })?;
            Ok::<_, EngineError>(user.username)
        })?;
        self.add_member(treasury_id, actor, &username, role).await
    }

    /// Changes a member's role (admin-only). The last admin cannot be demoted.
    pub async fn update_member_role(
        &self,
        treasury_id: Uuid,
        member_id: Uuid,
        actor: &str,
        role: MemberRole,
    ) -> ResultEngine<Member> {
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, treasury_id, actor).await?;
            let current = self.find_member(&db_tx, treasury_id, member_id).await?;
            if MemberRole::try_from(current.role.as_str())?.is_admin() && !role.is_admin() {
                self.ensure_other_admin(&db_tx, treasury_id).await?;
            }

            let model = members::ActiveModel {
                id: ActiveValue::Set(current.id),
                role: ActiveValue::Set(role.as_str().to_string()),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;
            Member::try_from(model)
        })
    }

    /// Removes a member (admin-only). The last admin cannot be removed.
    pub async fn remove_member(
        &self,
        treasury_id: Uuid,
        member_id: Uuid,
        actor: &str,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, treasury_id, actor).await?;
            let current = self.find_member(&db_tx, treasury_id, member_id).await?;
            if MemberRole::try_from(current.role.as_str())?.is_admin() {
                self.ensure_other_admin(&db_tx, treasury_id).await?;
            }
            members::Entity::delete_by_id(current.id)
                .exec(&db_tx)
                .await?;
            Ok::<_, EngineError>(())
        })?;

        tracing::info!(treasury_id = %treasury_id, member_id = %member_id, "Member removed");
        Ok(())
    }
}
