//! Content lifecycle
//!
//! Orchestrates create/edit/delete of articles and comments: checks the
//! authorization policy first, validates input, and sequences the image
//! store against the database so that a failure at any point leaves prior
//! state fully intact and a success leaves no orphaned file.

use crate::db::models::{Article, Comment, User};
use crate::db::Repository;
use crate::errors::{AppError, Result};
use crate::policy;
use crate::storage::{ImageStore, ImageUpload};
use std::sync::Arc;

/// Reject empty (or whitespace-only) required text fields
fn require_non_empty(value: &str, field: &'static str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation {
            message: format!("{} must not be empty", field),
            field: Some(field.to_string()),
        });
    }
    Ok(())
}

/// Lifecycle manager for articles and comments
#[derive(Clone)]
pub struct ContentService {
    repo: Repository,
    images: Arc<dyn ImageStore>,
}

impl ContentService {
    pub fn new(repo: Repository, images: Arc<dyn ImageStore>) -> Self {
        Self { repo, images }
    }

    /// Create an article owned by `actor`, storing the image (if any) under
    /// a freshly generated name first. If the row insert then fails, the
    /// stored file is removed again.
    pub async fn create_article(
        &self,
        actor: &User,
        title: String,
        body: String,
        image: Option<ImageUpload>,
    ) -> Result<Article> {
        require_non_empty(&title, "title")?;
        require_non_empty(&body, "body")?;

        let stored_name = match image {
            Some(upload) => Some(self.images.save(upload).await?),
            None => None,
        };

        match self
            .repo
            .create_article(actor.id, title, body, stored_name.clone())
            .await
        {
            Ok(article) => {
                crate::metrics::record_article_created();
                tracing::info!(
                    article_id = article.id,
                    user_id = actor.id,
                    "Article created"
                );
                Ok(article)
            }
            Err(e) => {
                if let Some(name) = stored_name {
                    let _ = self.images.delete(&name).await;
                }
                Err(e)
            }
        }
    }

    /// Edit an article. Only the owner or an admin may; a replacement image
    /// is stored before the row update and the previous file is released
    /// only once the new state is durable, so neither file leaks.
    pub async fn edit_article(
        &self,
        actor: &User,
        article_id: i64,
        title: String,
        body: String,
        image: Option<ImageUpload>,
    ) -> Result<Article> {
        let article = self
            .repo
            .find_article_by_id(article_id)
            .await?
            .ok_or(AppError::ArticleNotFound { id: article_id })?;

        if !policy::can_modify(actor, article.user_id) {
            return Err(AppError::Forbidden {
                message: "You may not edit articles you do not own".to_string(),
            });
        }

        require_non_empty(&title, "title")?;
        require_non_empty(&body, "body")?;

        let new_stored = match image {
            Some(upload) => Some(self.images.save(upload).await?),
            None => None,
        };

        match self
            .repo
            .update_article(article_id, title, body, new_stored.clone())
            .await
        {
            Ok(updated) => {
                if new_stored.is_some() {
                    if let Some(old) = article.image {
                        if let Err(e) = self.images.delete(&old).await {
                            tracing::warn!(
                                article_id,
                                stored_name = %old,
                                error = %e,
                                "Failed to release replaced article image"
                            );
                        }
                    }
                }
                tracing::info!(article_id, user_id = actor.id, "Article updated");
                Ok(updated)
            }
            Err(e) => {
                if let Some(name) = new_stored {
                    let _ = self.images.delete(&name).await;
                }
                Err(e)
            }
        }
    }

    /// Delete an article with its full cascade: dependent comments and
    /// likes go in the same transaction with the article row last, then the
    /// stored image (if any) is released.
    pub async fn delete_article(&self, actor: &User, article_id: i64) -> Result<()> {
        let article = self
            .repo
            .find_article_by_id(article_id)
            .await?
            .ok_or(AppError::ArticleNotFound { id: article_id })?;

        if !policy::can_modify(actor, article.user_id) {
            return Err(AppError::Forbidden {
                message: "You may not delete articles you do not own".to_string(),
            });
        }

        self.repo.delete_article_cascade(article_id).await?;

        if let Some(image) = article.image {
            if let Err(e) = self.images.delete(&image).await {
                tracing::warn!(
                    article_id,
                    stored_name = %image,
                    error = %e,
                    "Failed to release image of deleted article"
                );
            }
        }

        crate::metrics::record_article_deleted();
        tracing::info!(article_id, user_id = actor.id, "Article deleted");
        Ok(())
    }

    /// Add a comment by `actor` to an existing article
    pub async fn add_comment(
        &self,
        actor: &User,
        article_id: i64,
        text: String,
    ) -> Result<Comment> {
        if self.repo.find_article_by_id(article_id).await?.is_none() {
            return Err(AppError::ArticleNotFound { id: article_id });
        }

        require_non_empty(&text, "comment")?;

        let comment = self.repo.create_comment(actor.id, article_id, text).await?;

        crate::metrics::record_comment_created();
        tracing::info!(
            comment_id = comment.id,
            article_id,
            user_id = actor.id,
            "Comment added"
        );
        Ok(comment)
    }

    /// Delete a comment. Returns the id of the article the comment was on,
    /// resolved before the permission check so even the denied path knows
    /// where the comment lived.
    pub async fn delete_comment(&self, actor: &User, comment_id: i64) -> Result<i64> {
        let comment = self
            .repo
            .find_comment_by_id(comment_id)
            .await?
            .ok_or(AppError::CommentNotFound { id: comment_id })?;

        let article_id = comment.article_id;

        if !policy::can_modify(actor, comment.user_id) {
            return Err(AppError::Forbidden {
                message: "You may not delete comments you did not write".to_string(),
            });
        }

        self.repo.delete_comment(comment_id).await?;

        tracing::info!(comment_id, article_id, user_id = actor.id, "Comment deleted");
        Ok(article_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_non_empty_accepts_text() {
        assert!(require_non_empty("Hello", "title").is_ok());
    }

    #[test]
    fn test_require_non_empty_rejects_empty() {
        let err = require_non_empty("", "title").unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation { field: Some(ref f), .. } if f == "title"
        ));
    }

    #[test]
    fn test_require_non_empty_rejects_whitespace() {
        assert!(require_non_empty("   \n\t", "body").is_err());
    }
}
