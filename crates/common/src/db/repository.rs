//! Repository pattern for database operations
//!
//! Provides a clean interface for all data access operations
//! with proper error handling and transaction support.

use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use sea_orm::sea_query::{extension::postgres::PgExpr, Expr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbBackend,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, SqlErr, Statement,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};

/// Side of the toggle a like operation landed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeState {
    Liked,
    Unliked,
}

/// Result of a like toggle: the new state and the post-commit count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeToggle {
    pub state: LikeState,
    pub count: u64,
}

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the read connection
    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    /// Get the write connection
    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // User Operations
    // ========================================================================

    /// Create a new user from already-hashed credentials
    pub async fn create_user(
        &self,
        username: String,
        email: String,
        password_hash: String,
    ) -> Result<User> {
        let user = UserActiveModel {
            username: Set(username),
            email: Set(email),
            password_hash: Set(password_hash),
            bio: Set(None),
            profile_picture: Set(None),
            is_admin: Set(false),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        };

        match user.insert(self.write_conn()).await {
            Ok(user) => Ok(user),
            // The pre-insert uniqueness checks race against concurrent
            // registrations; the unique constraints are the backstop.
            Err(e) => match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => Err(AppError::Conflict {
                    message: "username or email already registered".to_string(),
                }),
                _ => Err(e.into()),
            },
        }
    }

    /// Find user by ID
    pub async fn find_user_by_id(&self, id: i64) -> Result<Option<User>> {
        UserEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find user by username
    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        UserEntity::find()
            .filter(UserColumn::Username.eq(username))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Check whether a username is held by anyone other than `exclude`
    pub async fn username_taken(&self, username: &str, exclude: Option<i64>) -> Result<bool> {
        let mut query = UserEntity::find().filter(UserColumn::Username.eq(username));
        if let Some(id) = exclude {
            query = query.filter(UserColumn::Id.ne(id));
        }
        Ok(query.count(self.read_conn()).await? > 0)
    }

    /// Check whether an email is held by anyone other than `exclude`
    pub async fn email_taken(&self, email: &str, exclude: Option<i64>) -> Result<bool> {
        let mut query = UserEntity::find().filter(UserColumn::Email.eq(email));
        if let Some(id) = exclude {
            query = query.filter(UserColumn::Id.ne(id));
        }
        Ok(query.count(self.read_conn()).await? > 0)
    }

    /// Update a user's own profile fields
    pub async fn update_profile(
        &self,
        user_id: i64,
        username: String,
        email: String,
        bio: Option<String>,
    ) -> Result<User> {
        let mut user: UserActiveModel = UserEntity::find_by_id(user_id)
            .one(self.write_conn())
            .await?
            .ok_or(AppError::UserNotFound {
                id: user_id.to_string(),
            })?
            .into();

        user.username = Set(username);
        user.email = Set(email);
        user.bio = Set(bio);

        user.update(self.write_conn()).await.map_err(Into::into)
    }

    /// Replace the stored profile picture name
    pub async fn set_profile_picture(
        &self,
        user_id: i64,
        stored_name: Option<String>,
    ) -> Result<User> {
        let mut user: UserActiveModel = UserEntity::find_by_id(user_id)
            .one(self.write_conn())
            .await?
            .ok_or(AppError::UserNotFound {
                id: user_id.to_string(),
            })?
            .into();

        user.profile_picture = Set(stored_name);

        user.update(self.write_conn()).await.map_err(Into::into)
    }

    /// Set the admin flag on a user
    pub async fn set_admin(&self, user_id: i64, is_admin: bool) -> Result<User> {
        let mut user: UserActiveModel = UserEntity::find_by_id(user_id)
            .one(self.write_conn())
            .await?
            .ok_or(AppError::UserNotFound {
                id: user_id.to_string(),
            })?
            .into();

        user.is_admin = Set(is_admin);

        user.update(self.write_conn()).await.map_err(Into::into)
    }

    /// List all users, oldest first
    pub async fn list_users(&self) -> Result<Vec<User>> {
        UserEntity::find()
            .order_by_asc(UserColumn::Id)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Article Operations
    // ========================================================================

    /// Create a new article owned by `user_id`
    pub async fn create_article(
        &self,
        user_id: i64,
        title: String,
        body: String,
        image: Option<String>,
    ) -> Result<Article> {
        let now = chrono::Utc::now();

        let article = ArticleActiveModel {
            title: Set(title),
            body: Set(body),
            image: Set(image),
            views: Set(0),
            user_id: Set(user_id),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };

        article.insert(self.write_conn()).await.map_err(Into::into)
    }

    /// Find article by ID
    pub async fn find_article_by_id(&self, id: i64) -> Result<Option<Article>> {
        ArticleEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find article by ID together with its author
    pub async fn find_article_with_author(
        &self,
        id: i64,
    ) -> Result<Option<(Article, Option<User>)>> {
        ArticleEntity::find_by_id(id)
            .find_also_related(UserEntity)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Paginated listing with optional case-insensitive title/body search,
    /// newest first. `page` is 1-based.
    pub async fn search_articles(
        &self,
        query: Option<&str>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<(Article, Option<User>)>, u64)> {
        let mut select = ArticleEntity::find();

        if let Some(q) = query.map(str::trim).filter(|q| !q.is_empty()) {
            let pattern = format!("%{}%", q);
            select = select.filter(
                Condition::any()
                    .add(Expr::col((ArticleEntity, ArticleColumn::Title)).ilike(pattern.as_str()))
                    .add(Expr::col((ArticleEntity, ArticleColumn::Body)).ilike(pattern.as_str())),
            );
        }

        let paginator = select
            .find_also_related(UserEntity)
            .order_by_desc(ArticleColumn::CreatedAt)
            .paginate(self.read_conn(), per_page.max(1));

        let total = paginator.num_items().await?;
        let articles = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((articles, total))
    }

    /// All articles by one author, newest first
    pub async fn articles_by_user(&self, user_id: i64) -> Result<Vec<Article>> {
        ArticleEntity::find()
            .filter(ArticleColumn::UserId.eq(user_id))
            .order_by_desc(ArticleColumn::CreatedAt)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Update title, body and (when supplied) the stored image name.
    /// `new_image = None` keeps the current image.
    pub async fn update_article(
        &self,
        id: i64,
        title: String,
        body: String,
        new_image: Option<String>,
    ) -> Result<Article> {
        let mut article: ArticleActiveModel = ArticleEntity::find_by_id(id)
            .one(self.write_conn())
            .await?
            .ok_or(AppError::ArticleNotFound { id })?
            .into();

        article.title = Set(title);
        article.body = Set(body);
        if let Some(name) = new_image {
            article.image = Set(Some(name));
        }
        article.updated_at = Set(chrono::Utc::now().into());

        article.update(self.write_conn()).await.map_err(Into::into)
    }

    /// Increment the view counter, returning the new value, or None if the
    /// article does not exist. A single UPDATE keeps concurrent increments
    /// from losing writes; exactly-once is not promised to concurrent readers.
    pub async fn increment_views(&self, id: i64) -> Result<Option<i64>> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "UPDATE articles SET views = views + 1 WHERE id = $1 RETURNING views",
            vec![id.into()],
        );

        let row = self.write_conn().query_one(stmt).await?;

        match row {
            Some(row) => Ok(Some(row.try_get_by_index::<i64>(0)?)),
            None => Ok(None),
        }
    }

    /// Delete an article and everything that references it, in one
    /// transaction. Dependents go first and the article row last, so a
    /// failure at any point leaves the full prior state intact.
    pub async fn delete_article_cascade(&self, id: i64) -> Result<()> {
        let txn = self.write_conn().begin().await?;

        LikeEntity::delete_many()
            .filter(LikeColumn::ArticleId.eq(id))
            .exec(&txn)
            .await?;

        CommentEntity::delete_many()
            .filter(CommentColumn::ArticleId.eq(id))
            .exec(&txn)
            .await?;

        let deleted = ArticleEntity::delete_by_id(id).exec(&txn).await?;
        if deleted.rows_affected == 0 {
            txn.rollback().await?;
            return Err(AppError::ArticleNotFound { id });
        }

        txn.commit().await?;
        Ok(())
    }

    // ========================================================================
    // Comment Operations
    // ========================================================================

    /// Create a comment on an article
    pub async fn create_comment(
        &self,
        user_id: i64,
        article_id: i64,
        text: String,
    ) -> Result<Comment> {
        let comment = CommentActiveModel {
            text: Set(text),
            user_id: Set(user_id),
            article_id: Set(article_id),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        };

        comment.insert(self.write_conn()).await.map_err(Into::into)
    }

    /// Find comment by ID
    pub async fn find_comment_by_id(&self, id: i64) -> Result<Option<Comment>> {
        CommentEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Comments on an article with their authors, oldest first
    pub async fn comments_for_article(
        &self,
        article_id: i64,
    ) -> Result<Vec<(Comment, Option<User>)>> {
        CommentEntity::find()
            .filter(CommentColumn::ArticleId.eq(article_id))
            .find_also_related(UserEntity)
            .order_by_asc(CommentColumn::CreatedAt)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Delete a single comment row (no further cascade)
    pub async fn delete_comment(&self, id: i64) -> Result<()> {
        let deleted = CommentEntity::delete_by_id(id)
            .exec(self.write_conn())
            .await?;

        if deleted.rows_affected == 0 {
            return Err(AppError::CommentNotFound { id });
        }

        Ok(())
    }

    // ========================================================================
    // Like Operations
    // ========================================================================

    /// Number of likes on an article
    pub async fn like_count(&self, article_id: i64) -> Result<u64> {
        LikeEntity::find()
            .filter(LikeColumn::ArticleId.eq(article_id))
            .count(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Whether a user currently likes an article
    pub async fn user_has_liked(&self, user_id: i64, article_id: i64) -> Result<bool> {
        Ok(LikeEntity::find_by_id((user_id, article_id))
            .one(self.read_conn())
            .await?
            .is_some())
    }

    /// Atomically flip the like state for (user, article) and return the
    /// new state with the count read after the mutation, all inside one
    /// transaction.
    ///
    /// The composite primary key makes the check-then-act safe: of two
    /// concurrent toggles from the same user, one observes absent-then-insert
    /// and the other present-then-delete, or the second hits the key conflict
    /// and surfaces `Conflict` for the caller to retry.
    pub async fn toggle_like(&self, user_id: i64, article_id: i64) -> Result<LikeToggle> {
        let txn = self.write_conn().begin().await?;

        let deleted = LikeEntity::delete_by_id((user_id, article_id))
            .exec(&txn)
            .await?;

        let state = if deleted.rows_affected > 0 {
            LikeState::Unliked
        } else {
            let stmt = Statement::from_sql_and_values(
                DbBackend::Postgres,
                r#"
                INSERT INTO likes (user_id, article_id, created_at)
                VALUES ($1, $2, $3)
                ON CONFLICT (user_id, article_id) DO NOTHING
                "#,
                vec![user_id.into(), article_id.into(), chrono::Utc::now().into()],
            );

            let inserted = txn.execute(stmt).await?;
            if inserted.rows_affected() == 0 {
                // A concurrent toggle won the race between our delete and
                // insert; the row exists again.
                txn.rollback().await?;
                return Err(AppError::Conflict {
                    message: format!(
                        "concurrent like toggle for user {} on article {}",
                        user_id, article_id
                    ),
                });
            }
            LikeState::Liked
        };

        let count = LikeEntity::find()
            .filter(LikeColumn::ArticleId.eq(article_id))
            .count(&txn)
            .await?;

        txn.commit().await?;

        Ok(LikeToggle { state, count })
    }
}
