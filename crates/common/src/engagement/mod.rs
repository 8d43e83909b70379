//! Like toggle service
//!
//! The one operation with an explicit cross-request atomicity contract:
//! flipping a user's like on an article must serialize against concurrent
//! toggles of the same (user, article) pair. The repository transaction
//! plus the composite key carry the guarantee; this service adds the
//! single retry for the conflict window between its delete and insert.

use crate::db::models::User;
use crate::db::{LikeToggle, Repository};
use crate::errors::{AppError, Result};

#[derive(Clone)]
pub struct LikeService {
    repo: Repository,
}

impl LikeService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Flip `actor`'s like on an article, reporting the new state and the
    /// post-commit count. Never user-facing-fails for a valid actor/article
    /// pair: a lost race is retried once before surfacing.
    pub async fn toggle(&self, actor: &User, article_id: i64) -> Result<LikeToggle> {
        if self.repo.find_article_by_id(article_id).await?.is_none() {
            return Err(AppError::ArticleNotFound { id: article_id });
        }

        let result = match self.repo.toggle_like(actor.id, article_id).await {
            Ok(result) => result,
            Err(AppError::Conflict { .. }) => {
                tracing::warn!(
                    user_id = actor.id,
                    article_id,
                    "Like toggle lost a race, retrying once"
                );
                self.repo.toggle_like(actor.id, article_id).await?
            }
            Err(e) => return Err(e),
        };

        crate::metrics::record_like_toggle(result.state);
        tracing::debug!(
            user_id = actor.id,
            article_id,
            state = ?result.state,
            count = result.count,
            "Like toggled"
        );

        Ok(result)
    }
}
