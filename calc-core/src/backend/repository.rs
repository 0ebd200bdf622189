use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::content::{BlogPost, BlogPostRequest};
use crate::models::{
    AnalyticsEvent, AuthUser, ContactMessage, NewAnalyticsEvent, Profile, Subscriber, UserRole,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("Record not found")]
    NotFound,

    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Not authorized")]
    Unauthorized,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Malformed response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// Limit and timestamp ordering for a table read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    pub limit: u32,
    pub order: SortOrder,
}

impl ListQuery {
    pub fn newest(limit: u32) -> Self {
        Self {
            limit,
            order: SortOrder::NewestFirst,
        }
    }
}

/// The hosted backend: auth lookups plus filtered, ordered, limited reads.
///
/// Row-level access control belongs to the implementation; callers may
/// pre-check roles for UX but must not rely on that check.
#[async_trait]
pub trait SiteBackend: Send + Sync {
    // Auth
    async fn current_user(&self, access_token: &str) -> Result<Option<AuthUser>, BackendError>;
    async fn roles_for_user(&self, user_id: &str) -> Result<Vec<UserRole>, BackendError>;
    async fn get_profile(&self, user_id: &str) -> Result<Profile, BackendError>;

    // Admin datasets
    async fn list_subscribers(&self, query: &ListQuery) -> Result<Vec<Subscriber>, BackendError>;
    async fn list_contact_messages(
        &self,
        query: &ListQuery,
    ) -> Result<Vec<ContactMessage>, BackendError>;
    async fn list_analytics_events(
        &self,
        query: &ListQuery,
    ) -> Result<Vec<AnalyticsEvent>, BackendError>;

    // Writes from the public site
    async fn record_analytics_event(
        &self,
        event: NewAnalyticsEvent,
    ) -> Result<AnalyticsEvent, BackendError>;
}

/// Remote function that drafts a blog post.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate_post(&self, request: &BlogPostRequest) -> Result<BlogPost, BackendError>;
}
