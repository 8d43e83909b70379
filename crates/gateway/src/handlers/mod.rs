//! API handlers module

pub mod admin;
pub mod articles;
pub mod assistant;
pub mod auth;
pub mod comments;
pub mod health;
pub mod likes;
pub mod users;

use crate::AppState;
use inkpress_common::{ContentService, Repository};

/// Build a repository over the shared pool
pub(crate) fn repository(state: &AppState) -> Repository {
    Repository::new(state.db.clone())
}

/// Build the content lifecycle service
pub(crate) fn content_service(state: &AppState) -> ContentService {
    ContentService::new(repository(state), state.images.clone())
}

/// Public URL path for a stored image name
pub(crate) fn image_url(stored: Option<&str>) -> Option<String> {
    stored.map(|name| format!("/uploads/{}", name))
}
