//! Article handlers: listing/search, detail with view counting, and the
//! authenticated create/edit/delete lifecycle

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::extract::CurrentUser;
use crate::AppState;
use inkpress_common::{
    db::models::{Article, User},
    errors::{AppError, Result},
    metrics, ImageUpload, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};

/// Listing query parameters: optional search term plus 1-based pagination
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Serialize)]
pub struct AuthorRef {
    pub id: i64,
    pub username: String,
}

impl AuthorRef {
    fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

#[derive(Serialize)]
pub struct ArticleResponse {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub image_url: Option<String>,
    pub views: i64,
    pub user_id: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl ArticleResponse {
    fn from_article(article: Article) -> Self {
        Self {
            id: article.id,
            title: article.title,
            body: article.body,
            image_url: super::image_url(article.image.as_deref()),
            views: article.views,
            user_id: article.user_id,
            created_at: article.created_at.to_rfc3339(),
            updated_at: article.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct ArticleSummary {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub image_url: Option<String>,
    pub views: i64,
    pub created_at: String,
    pub author: Option<AuthorRef>,
}

#[derive(Serialize)]
pub struct ArticleListResponse {
    pub articles: Vec<ArticleSummary>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub total_pages: u64,
}

#[derive(Serialize)]
pub struct CommentView {
    pub id: i64,
    pub text: String,
    pub created_at: String,
    pub author: Option<AuthorRef>,
}

#[derive(Serialize)]
pub struct ArticleDetail {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub image_url: Option<String>,
    pub views: i64,
    pub created_at: String,
    pub updated_at: String,
    pub author: Option<AuthorRef>,
    pub like_count: u64,
    pub comments: Vec<CommentView>,
}

/// Article form fields as read from a multipart body
struct ArticleForm {
    title: String,
    body: String,
    image: Option<ImageUpload>,
}

fn bad_multipart(e: MultipartError) -> AppError {
    AppError::Validation {
        message: format!("Malformed multipart body: {}", e),
        field: None,
    }
}

/// Read `title`, `body` and the optional `image` part. Unknown parts are
/// ignored; an image part without a filename or content counts as absent.
async fn read_article_form(mut multipart: Multipart) -> Result<ArticleForm> {
    let mut title = String::new();
    let mut body = String::new();
    let mut image = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        match field.name() {
            Some("title") => title = field.text().await.map_err(bad_multipart)?,
            Some("body") => body = field.text().await.map_err(bad_multipart)?,
            Some("image") => {
                let filename = field.file_name().map(str::to_owned);
                let data = field.bytes().await.map_err(bad_multipart)?;

                if let Some(filename) = filename.filter(|name| !name.is_empty()) {
                    if !data.is_empty() {
                        image = Some(ImageUpload {
                            filename,
                            data: data.to_vec(),
                        });
                    }
                }
            }
            _ => {}
        }
    }

    Ok(ArticleForm { title, body, image })
}

/// GET /articles - paginated listing with optional search
pub async fn list_articles(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ArticleListResponse>> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query
        .per_page
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let repo = super::repository(&state);
    let (rows, total) = repo
        .search_articles(query.q.as_deref(), page, per_page)
        .await?;

    let articles = rows
        .into_iter()
        .map(|(article, author)| ArticleSummary {
            id: article.id,
            title: article.title,
            body: article.body,
            image_url: super::image_url(article.image.as_deref()),
            views: article.views,
            created_at: article.created_at.to_rfc3339(),
            author: author.as_ref().map(AuthorRef::from_user),
        })
        .collect();

    Ok(Json(ArticleListResponse {
        articles,
        page,
        per_page,
        total,
        total_pages: total.div_ceil(per_page),
    }))
}

/// GET /articles/{id} - article detail; every successful fetch bumps the
/// approximate view counter first
pub async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ArticleDetail>> {
    let repo = super::repository(&state);

    let views = repo
        .increment_views(id)
        .await?
        .ok_or(AppError::ArticleNotFound { id })?;
    metrics::record_article_view();

    let (article, author) = repo
        .find_article_with_author(id)
        .await?
        .ok_or(AppError::ArticleNotFound { id })?;

    let comments = repo.comments_for_article(id).await?;
    let like_count = repo.like_count(id).await?;

    Ok(Json(ArticleDetail {
        id: article.id,
        title: article.title,
        body: article.body,
        image_url: super::image_url(article.image.as_deref()),
        views,
        created_at: article.created_at.to_rfc3339(),
        updated_at: article.updated_at.to_rfc3339(),
        author: author.as_ref().map(AuthorRef::from_user),
        like_count,
        comments: comments
            .into_iter()
            .map(|(comment, author)| CommentView {
                id: comment.id,
                text: comment.text,
                created_at: comment.created_at.to_rfc3339(),
                author: author.as_ref().map(AuthorRef::from_user),
            })
            .collect(),
    }))
}

/// POST /articles - create an article (multipart: title, body, optional image)
pub async fn create_article(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ArticleResponse>)> {
    let form = read_article_form(multipart).await?;

    let article = super::content_service(&state)
        .create_article(&user, form.title, form.body, form.image)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ArticleResponse::from_article(article)),
    ))
}

/// PUT /articles/{id} - edit an article (owner or admin)
pub async fn update_article(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<ArticleResponse>> {
    let form = read_article_form(multipart).await?;

    let article = super::content_service(&state)
        .edit_article(&user, id, form.title, form.body, form.image)
        .await?;

    Ok(Json(ArticleResponse::from_article(article)))
}

/// DELETE /articles/{id} - delete an article with its full cascade
pub async fn delete_article(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    super::content_service(&state)
        .delete_article(&user, id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
