//! Like toggle handler

use axum::{
    extract::{Path, State},
    Json,
};

use crate::extract::CurrentUser;
use crate::AppState;
use inkpress_common::{errors::Result, LikeService, LikeToggle};

/// POST /articles/{id}/like - flip the caller's like on an article and
/// report the resulting state and count
pub async fn toggle_like(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(article_id): Path<i64>,
) -> Result<Json<LikeToggle>> {
    let result = LikeService::new(super::repository(&state))
        .toggle(&user, article_id)
        .await?;

    Ok(Json(result))
}
