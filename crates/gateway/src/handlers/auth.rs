//! Registration and login handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use inkpress_common::{
    auth,
    errors::{AppError, Result},
};

/// Request to register a new account
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 20))]
    pub username: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Register a new user after uniqueness checks on username and email
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let repo = super::repository(&state);

    if repo.username_taken(&request.username, None).await? {
        return Err(AppError::DuplicateUsername {
            username: request.username,
        });
    }
    if repo.email_taken(&request.email, None).await? {
        return Err(AppError::DuplicateEmail {
            email: request.email,
        });
    }

    let password_hash = auth::hash_password(&request.password)?;
    let user = repo
        .create_user(request.username, request.email, password_hash)
        .await?;

    tracing::info!(user_id = user.id, username = %user.username, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: user.id,
            username: user.username,
        }),
    ))
}

/// Verify credentials and issue a bearer token
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let repo = super::repository(&state);

    let user = repo
        .find_user_by_username(&request.username)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !auth::verify_password(&request.password, &user.password_hash) {
        return Err(AppError::InvalidCredentials);
    }

    let token = state.jwt.generate_token(user.id)?;

    tracing::info!(user_id = user.id, username = %user.username, "User logged in");

    Ok(Json(LoginResponse {
        token,
        token_type: "bearer".to_string(),
        expires_in: state.jwt.expiration_secs(),
    }))
}
