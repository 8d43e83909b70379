//! SeaORM entity models
//!
//! Database entities for the Inkpress blog

mod article;
mod comment;
mod like;
mod user;

pub use user::{
    Entity as UserEntity,
    Model as User,
    ActiveModel as UserActiveModel,
    Column as UserColumn,
};

pub use article::{
    Entity as ArticleEntity,
    Model as Article,
    ActiveModel as ArticleActiveModel,
    Column as ArticleColumn,
};

pub use comment::{
    Entity as CommentEntity,
    Model as Comment,
    ActiveModel as CommentActiveModel,
    Column as CommentColumn,
};

pub use like::{
    Entity as LikeEntity,
    Model as Like,
    ActiveModel as LikeActiveModel,
    Column as LikeColumn,
};
