//! Admin user management handlers

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::extract::AdminUser;
use crate::AppState;
use inkpress_common::{
    errors::{AppError, Result},
    policy::{self, RoleToggle},
};

#[derive(Serialize)]
pub struct AdminUserView {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct ToggleAdminResponse {
    pub user_id: i64,
    pub changed: bool,
    pub is_admin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// GET /admin/users - list all users for role management
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Vec<AdminUserView>>> {
    let users = super::repository(&state)
        .list_users()
        .await?
        .into_iter()
        .map(|user| AdminUserView {
            id: user.id,
            username: user.username,
            email: user.email,
            is_admin: user.is_admin,
            created_at: user.created_at.to_rfc3339(),
        })
        .collect();

    Ok(Json(users))
}

/// POST /admin/users/{id}/toggle-admin - flip another user's admin flag.
/// Targeting yourself is a warned no-op, not an error.
pub async fn toggle_admin(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    Path(user_id): Path<i64>,
) -> Result<Json<ToggleAdminResponse>> {
    let repo = super::repository(&state);

    let target = repo
        .find_user_by_id(user_id)
        .await?
        .ok_or(AppError::UserNotFound {
            id: user_id.to_string(),
        })?;

    match policy::toggle_admin_decision(&actor, &target) {
        RoleToggle::SelfToggleRefused => {
            tracing::warn!(
                user_id = actor.id,
                "Refused self-toggle of the administrator role"
            );

            Ok(Json(ToggleAdminResponse {
                user_id,
                changed: false,
                is_admin: target.is_admin,
                warning: Some("You cannot change your own administrator role.".to_string()),
            }))
        }
        RoleToggle::Apply { is_admin } => {
            let updated = repo.set_admin(user_id, is_admin).await?;

            tracing::info!(
                actor_id = actor.id,
                target_id = updated.id,
                is_admin = updated.is_admin,
                "Administrator role toggled"
            );

            Ok(Json(ToggleAdminResponse {
                user_id,
                changed: true,
                is_admin: updated.is_admin,
                warning: None,
            }))
        }
    }
}
