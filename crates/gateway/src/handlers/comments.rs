//! Comment handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::extract::CurrentUser;
use crate::AppState;
use inkpress_common::errors::{AppError, Result};

#[derive(Debug, Deserialize, Validate)]
pub struct AddCommentRequest {
    #[validate(length(min = 1, max = 2000))]
    pub text: String,
}

#[derive(Serialize)]
pub struct CommentResponse {
    pub id: i64,
    pub text: String,
    pub article_id: i64,
    pub user_id: i64,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct DeleteCommentResponse {
    /// The article the comment lived on, so the client can return there
    pub article_id: i64,
}

/// POST /articles/{id}/comments - add a comment to an existing article
pub async fn add_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(article_id): Path<i64>,
    Json(request): Json<AddCommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>)> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: Some("text".to_string()),
    })?;

    let comment = super::content_service(&state)
        .add_comment(&user, article_id, request.text)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CommentResponse {
            id: comment.id,
            text: comment.text,
            article_id: comment.article_id,
            user_id: comment.user_id,
            created_at: comment.created_at.to_rfc3339(),
        }),
    ))
}

/// DELETE /comments/{id} - delete a comment (author or admin)
pub async fn delete_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(comment_id): Path<i64>,
) -> Result<Json<DeleteCommentResponse>> {
    let article_id = super::content_service(&state)
        .delete_comment(&user, comment_id)
        .await?;

    Ok(Json(DeleteCommentResponse { article_id }))
}
