//! Actor extraction
//!
//! Bearer-token extractors that resolve the current actor. The user row is
//! reloaded on every request so a role change takes effect on the next
//! request rather than at token expiry.

use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};
use inkpress_common::{
    auth::extract_bearer,
    db::models::User,
    errors::{AppError, Result},
    policy, Repository,
};

use crate::AppState;

/// An authenticated user, rejected with 401 when absent or invalid
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized {
                message: "Missing Authorization header".to_string(),
            })?;

        let token = extract_bearer(header).ok_or_else(|| AppError::Unauthorized {
            message: "Authorization header is not a bearer token".to_string(),
        })?;

        let claims = state.jwt.validate_token(token)?;
        let user_id = claims.user_id()?;

        let user = Repository::new(state.db.clone())
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized {
                message: "Token subject no longer exists".to_string(),
            })?;

        Ok(CurrentUser(user))
    }
}

/// An authenticated administrator, rejected with 403 for everyone else
pub struct AdminUser(pub User);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        if !policy::can_manage_roles(&user) {
            return Err(AppError::Forbidden {
                message: "Administrator role required".to_string(),
            });
        }

        Ok(AdminUser(user))
    }
}
