//! User profile handlers

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::extract::CurrentUser;
use crate::AppState;
use inkpress_common::{
    db::models::User,
    errors::{AppError, Result},
    ImageStore, ImageUpload,
};

#[derive(Serialize)]
pub struct ProfileArticle {
    pub id: i64,
    pub title: String,
    pub views: i64,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct ProfileResponse {
    pub id: i64,
    pub username: String,
    pub bio: Option<String>,
    pub picture_url: Option<String>,
    pub created_at: String,
    pub articles: Vec<ProfileArticle>,
}

impl ProfileResponse {
    fn new(user: User, articles: Vec<ProfileArticle>) -> Self {
        Self {
            id: user.id,
            username: user.username,
            bio: user.bio,
            picture_url: super::image_url(user.profile_picture.as_deref()),
            created_at: user.created_at.to_rfc3339(),
            articles,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 3, max = 20))]
    pub username: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(max = 2000))]
    pub bio: Option<String>,
}

#[derive(Serialize)]
pub struct PictureResponse {
    pub picture_url: String,
}

/// GET /users/{username} - public profile with the user's articles,
/// newest first
pub async fn get_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<ProfileResponse>> {
    let repo = super::repository(&state);

    let user = repo
        .find_user_by_username(&username)
        .await?
        .ok_or(AppError::UserNotFound { id: username })?;

    let articles = repo
        .articles_by_user(user.id)
        .await?
        .into_iter()
        .map(|article| ProfileArticle {
            id: article.id,
            title: article.title,
            views: article.views,
            created_at: article.created_at.to_rfc3339(),
        })
        .collect();

    Ok(Json(ProfileResponse::new(user, articles)))
}

/// PUT /users/me - self-service profile edit; uniqueness checks exclude
/// the caller so keeping your own name is never a conflict
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let repo = super::repository(&state);

    if repo.username_taken(&request.username, Some(user.id)).await? {
        return Err(AppError::DuplicateUsername {
            username: request.username,
        });
    }
    if repo.email_taken(&request.email, Some(user.id)).await? {
        return Err(AppError::DuplicateEmail {
            email: request.email,
        });
    }

    let updated = repo
        .update_profile(user.id, request.username, request.email, request.bio)
        .await?;

    tracing::info!(user_id = updated.id, "Profile updated");

    Ok(Json(ProfileResponse::new(updated, Vec::new())))
}

fn bad_multipart(e: MultipartError) -> AppError {
    AppError::Validation {
        message: format!("Malformed multipart body: {}", e),
        field: None,
    }
}

/// PUT /users/me/picture - replace the profile picture. Mirrors the
/// article-image rules: the new file is stored first, the row updated, and
/// the previous file released only once the new state is durable.
pub async fn update_picture(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut multipart: Multipart,
) -> Result<Json<PictureResponse>> {
    let mut upload = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        if field.name() == Some("picture") {
            let filename = field.file_name().map(str::to_owned);
            let data = field.bytes().await.map_err(bad_multipart)?;

            if let Some(filename) = filename.filter(|name| !name.is_empty()) {
                if !data.is_empty() {
                    upload = Some(ImageUpload {
                        filename,
                        data: data.to_vec(),
                    });
                }
            }
        }
    }

    let upload = upload.ok_or(AppError::MissingField {
        field: "picture".to_string(),
    })?;

    let repo = super::repository(&state);
    let stored_name = state.images.save(upload).await?;

    let updated = match repo
        .set_profile_picture(user.id, Some(stored_name.clone()))
        .await
    {
        Ok(updated) => updated,
        Err(e) => {
            let _ = state.images.delete(&stored_name).await;
            return Err(e);
        }
    };

    if let Some(old) = user.profile_picture {
        if let Err(e) = state.images.delete(&old).await {
            tracing::warn!(
                user_id = user.id,
                stored_name = %old,
                error = %e,
                "Failed to release replaced profile picture"
            );
        }
    }

    tracing::info!(user_id = updated.id, "Profile picture updated");

    Ok(Json(PictureResponse {
        picture_url: super::image_url(updated.profile_picture.as_deref())
            .unwrap_or_default(),
    }))
}
