//! Membership management endpoints (admin-only).

use api_types::member::{MemberNew, MemberRole, MemberRoleUpdate, MemberView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::users;
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

fn map_role(role: MemberRole) -> engine::MemberRole {
    match role {
        MemberRole::Admin => engine::MemberRole::Admin,
        MemberRole::Treasurer => engine::MemberRole::Treasurer,
        MemberRole::Member => engine::MemberRole::Member,
    }
}

pub(crate) fn member_view(member: engine::Member) -> MemberView {
    MemberView {
        id: member.id,
        username: member.username,
        role: match member.role {
            engine::MemberRole::Admin => MemberRole::Admin,
            engine::MemberRole::Treasurer => MemberRole::Treasurer,
            engine::MemberRole::Member => MemberRole::Member,
        },
        joined_at: member.joined_at,
    }
}

pub async fn add(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<MemberNew>,
) -> Result<(StatusCode, Json<MemberView>), ServerError> {
    let role = map_role(payload.role);
    let member = match (payload.username, payload.email) {
        (Some(username), None) => {
            state
                .engine
                .add_member(id, &user.username, &username, role)
                .await?
        }
        (None, Some(email)) => {
            state
                .engine
                .add_member_by_email(id, &user.username, &email, role)
                .await?
        }
        _ => {
            return Err(ServerError::Generic(
                "exactly one of username or email is required".to_string(),
            ));
        }
    };
    Ok((StatusCode::CREATED, Json(member_view(member))))
}

pub async fn update_role(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path((id, member_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<MemberRoleUpdate>,
) -> Result<Json<MemberView>, ServerError> {
    let member = state
        .engine
        .update_member_role(id, member_id, &user.username, map_role(payload.role))
        .await?;
    Ok(Json(member_view(member)))
}

pub async fn remove(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path((id, member_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .remove_member(id, member_id, &user.username)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
