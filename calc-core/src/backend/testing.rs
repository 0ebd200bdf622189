//! In-memory [`SiteBackend`] for unit tests, with call counters and
//! switchable failures.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use super::repository::{BackendError, ListQuery, SiteBackend, SortOrder};
use crate::models::{
    AnalyticsEvent, AuthUser, ContactMessage, NewAnalyticsEvent, Profile, Role, Subscriber,
    UserRole,
};

#[derive(Default)]
pub(crate) struct RecordingBackend {
    pub users: HashMap<String, AuthUser>,
    pub roles: HashMap<String, Vec<Role>>,
    pub subscribers: Vec<Subscriber>,
    pub messages: Vec<ContactMessage>,
    pub events: Vec<AnalyticsEvent>,

    pub fail_auth: bool,
    pub fail_subscribers: bool,
    pub fail_messages: bool,
    pub fail_events: bool,
    pub fail_record: bool,
    pub dataset_delay: Option<Duration>,

    pub auth_calls: AtomicUsize,
    pub role_calls: AtomicUsize,
    pub dataset_calls: AtomicUsize,
    pub recorded: Mutex<Vec<NewAnalyticsEvent>>,
    pub last_queries: Mutex<Vec<ListQuery>>,
}

impl RecordingBackend {
    /// A backend with one admin (`admin-token`) and one plain user
    /// (`user-token`), two subscribers, two messages and three events.
    pub fn seeded() -> Self {
        let at = |day: u32| Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap();
        let mut backend = Self::default();

        backend.users.insert(
            "admin-token".to_string(),
            AuthUser {
                id: "u-admin".to_string(),
                email: Some("admin@example.com".to_string()),
            },
        );
        backend.users.insert(
            "user-token".to_string(),
            AuthUser {
                id: "u-user".to_string(),
                email: Some("user@example.com".to_string()),
            },
        );
        backend.roles.insert("u-admin".to_string(), vec![Role::Admin]);
        backend.roles.insert("u-user".to_string(), vec![Role::User]);

        backend.subscribers = (1..=2)
            .map(|i| Subscriber {
                id: i,
                email: format!("reader{i}@example.com"),
                source: Some("footer".to_string()),
                subscribed_at: at(i as u32),
            })
            .collect();
        backend.messages = vec![
            ContactMessage {
                id: 1,
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                subject: Some("Mortgage rates".to_string()),
                message: "Can you add ARM loans?".to_string(),
                is_read: false,
                created_at: at(3),
            },
            ContactMessage {
                id: 2,
                name: "Bo".to_string(),
                email: "bo@example.com".to_string(),
                subject: None,
                message: "Thanks!".to_string(),
                is_read: true,
                created_at: at(4),
            },
        ];
        backend.events = ["calculation", "calculation", "page_view"]
            .iter()
            .zip(1..)
            .map(|(kind, i)| AnalyticsEvent {
                id: i,
                event_type: kind.to_string(),
                page: Some("/calculators/bmi".to_string()),
                payload: None,
                created_at: at(i as u32),
            })
            .collect();
        backend
    }

    pub fn dataset_calls(&self) -> usize {
        self.dataset_calls.load(Ordering::SeqCst)
    }

    pub fn role_calls(&self) -> usize {
        self.role_calls.load(Ordering::SeqCst)
    }

    async fn dataset<T: Clone>(
        &self,
        rows: &[T],
        fail: bool,
        query: &ListQuery,
    ) -> Result<Vec<T>, BackendError> {
        self.dataset_calls.fetch_add(1, Ordering::SeqCst);
        self.last_queries.lock().unwrap().push(*query);
        if let Some(delay) = self.dataset_delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(BackendError::Unavailable("query failed".to_string()));
        }
        let mut rows = rows.to_vec();
        if query.order == SortOrder::NewestFirst {
            rows.reverse();
        }
        rows.truncate(query.limit as usize);
        Ok(rows)
    }
}

#[async_trait]
impl SiteBackend for RecordingBackend {
    async fn current_user(&self, access_token: &str) -> Result<Option<AuthUser>, BackendError> {
        self.auth_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_auth {
            return Err(BackendError::Unavailable("auth service down".to_string()));
        }
        Ok(self.users.get(access_token).cloned())
    }

    async fn roles_for_user(&self, user_id: &str) -> Result<Vec<UserRole>, BackendError> {
        self.role_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .roles
            .get(user_id)
            .into_iter()
            .flatten()
            .zip(1..)
            .map(|(role, id)| UserRole {
                id,
                user_id: user_id.to_string(),
                role: *role,
            })
            .collect())
    }

    async fn get_profile(&self, user_id: &str) -> Result<Profile, BackendError> {
        self.users
            .values()
            .find(|u| u.id == user_id)
            .map(|u| Profile {
                id: u.id.clone(),
                email: u.email.clone().unwrap_or_default(),
                display_name: None,
                created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            })
            .ok_or(BackendError::NotFound)
    }

    async fn list_subscribers(&self, query: &ListQuery) -> Result<Vec<Subscriber>, BackendError> {
        self.dataset(&self.subscribers, self.fail_subscribers, query)
            .await
    }

    async fn list_contact_messages(
        &self,
        query: &ListQuery,
    ) -> Result<Vec<ContactMessage>, BackendError> {
        self.dataset(&self.messages, self.fail_messages, query).await
    }

    async fn list_analytics_events(
        &self,
        query: &ListQuery,
    ) -> Result<Vec<AnalyticsEvent>, BackendError> {
        self.dataset(&self.events, self.fail_events, query).await
    }

    async fn record_analytics_event(
        &self,
        event: NewAnalyticsEvent,
    ) -> Result<AnalyticsEvent, BackendError> {
        if self.fail_record {
            return Err(BackendError::Unavailable("insert failed".to_string()));
        }
        let mut recorded = self.recorded.lock().unwrap();
        recorded.push(event.clone());
        Ok(AnalyticsEvent {
            id: recorded.len() as i64,
            event_type: event.event_type,
            page: event.page,
            payload: event.payload,
            created_at: Utc::now(),
        })
    }
}
