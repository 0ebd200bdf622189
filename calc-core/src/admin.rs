//! Read-only admin dashboard.
//!
//! ```text
//! Unauthenticated ──(no token / no user)──────────────► Unauthorized
//!        │
//!        └─(user resolved)─► CheckingRole ──(admin)──► Authorized
//!                                  └──────(other)────► Unauthorized
//! ```
//!
//! The role check only decides what to show. Whether the rows may be read
//! at all is the backend's decision.
//!
//! Only `Authorized` issues the three dataset reads, concurrently. Each
//! section succeeds or fails on its own.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::backend::{BackendError, ListQuery, SiteBackend};
use crate::models::{AnalyticsEvent, AuthUser, ContactMessage, Notice, Role, Subscriber};
use crate::scope::{Cancelled, ScopeHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    Unauthenticated,
    CheckingRole,
    Authorized,
    Unauthorized,
}

/// Row caps per dataset, newest rows first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardLimits {
    pub subscribers: u32,
    pub messages: u32,
    pub analytics: u32,
}

impl Default for DashboardLimits {
    fn default() -> Self {
        Self {
            subscribers: 200,
            messages: 200,
            analytics: 300,
        }
    }
}

/// One dashboard table.
#[derive(Debug, Clone, PartialEq)]
pub enum Section<T> {
    NotLoaded,
    Loaded(Vec<T>),
    Failed(BackendError),
}

impl<T> Section<T> {
    pub fn rows(&self) -> Option<&[T]> {
        match self {
            Self::Loaded(rows) => Some(rows),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Headline numbers over whatever sections loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub subscribers: usize,
    pub messages: usize,
    pub unread_messages: usize,
    pub events: usize,
    pub events_by_type: BTreeMap<String, usize>,
}

pub struct AdminDashboard<'a> {
    backend: &'a dyn SiteBackend,
    limits: DashboardLimits,
    state: AuthState,
    user: Option<AuthUser>,
    subscribers: Section<Subscriber>,
    messages: Section<ContactMessage>,
    events: Section<AnalyticsEvent>,
    notices: Vec<Notice>,
}

impl<'a> AdminDashboard<'a> {
    pub fn new(backend: &'a dyn SiteBackend) -> Self {
        Self::with_limits(backend, DashboardLimits::default())
    }

    pub fn with_limits(
        backend: &'a dyn SiteBackend,
        limits: DashboardLimits,
    ) -> Self {
        Self {
            backend,
            limits,
            state: AuthState::Unauthenticated,
            user: None,
            subscribers: Section::NotLoaded,
            messages: Section::NotLoaded,
            events: Section::NotLoaded,
            notices: Vec::new(),
        }
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn user(&self) -> Option<&AuthUser> {
        self.user.as_ref()
    }

    pub fn subscribers(&self) -> &Section<Subscriber> {
        &self.subscribers
    }

    pub fn messages(&self) -> &Section<ContactMessage> {
        &self.messages
    }

    pub fn events(&self) -> &Section<AnalyticsEvent> {
        &self.events
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Resolves the session, checks the role and, for admins, loads the
    /// three datasets. Backend failures become notices.
    ///
    /// # Errors
    ///
    /// [`Cancelled`] when `scope` ends first. Nothing that arrives after
    /// that point is applied.
    pub async fn load(
        &mut self,
        access_token: Option<&str>,
        scope: &ScopeHandle,
    ) -> Result<AuthState, Cancelled> {
        let Some(token) = access_token else {
            debug!("No session token");
            return Ok(self.transition(AuthState::Unauthorized));
        };

        let user = match scope.run(self.backend.current_user(token)).await? {
            Ok(Some(user)) => user,
            Ok(None) => {
                debug!("Session did not resolve to a user");
                return Ok(self.transition(AuthState::Unauthorized));
            }
            Err(e) => {
                error!(error = %e, "Failed to resolve session");
                self.notices.push(Notice::error(format!("Could not verify your session: {e}")));
                return Ok(self.transition(AuthState::Unauthorized));
            }
        };

        self.transition(AuthState::CheckingRole);
        let roles = scope.run(self.backend.roles_for_user(&user.id)).await?;
        self.user = Some(user);

        let is_admin = match roles {
            Ok(roles) => roles.iter().any(|r| r.role == Role::Admin),
            Err(e) => {
                error!(error = %e, "Failed to check roles");
                self.notices.push(Notice::error(format!("Could not check permissions: {e}")));
                false
            }
        };
        if !is_admin {
            return Ok(self.transition(AuthState::Unauthorized));
        }

        self.transition(AuthState::Authorized);
        self.load_datasets(scope).await?;
        Ok(self.state)
    }

    async fn load_datasets(
        &mut self,
        scope: &ScopeHandle,
    ) -> Result<(), Cancelled> {
        let backend = self.backend;
        let subscriber_query = ListQuery::newest(self.limits.subscribers);
        let message_query = ListQuery::newest(self.limits.messages);
        let event_query = ListQuery::newest(self.limits.analytics);

        let (subscribers, messages, events) = scope
            .run(async {
                tokio::join!(
                    backend.list_subscribers(&subscriber_query),
                    backend.list_contact_messages(&message_query),
                    backend.list_analytics_events(&event_query),
                )
            })
            .await?;

        self.subscribers = self.settle("subscribers", subscribers);
        self.messages = self.settle("contact messages", messages);
        self.events = self.settle("analytics events", events);
        Ok(())
    }

    fn settle<T>(
        &mut self,
        name: &str,
        outcome: Result<Vec<T>, BackendError>,
    ) -> Section<T> {
        match outcome {
            Ok(rows) => {
                debug!(section = name, rows = rows.len(), "Section loaded");
                Section::Loaded(rows)
            }
            Err(e) => {
                error!(section = name, error = %e, "Failed to load section");
                self.notices.push(Notice::error(format!("Failed to load {name}: {e}")));
                Section::Failed(e)
            }
        }
    }

    fn transition(
        &mut self,
        next: AuthState,
    ) -> AuthState {
        if next == AuthState::Unauthorized {
            warn!(from = ?self.state, "Admin access denied");
        } else {
            info!(from = ?self.state, to = ?next, "Dashboard state change");
        }
        self.state = next;
        next
    }

    pub fn summary(&self) -> DashboardSummary {
        let mut summary = DashboardSummary::default();
        if let Some(rows) = self.subscribers.rows() {
            summary.subscribers = rows.len();
        }
        if let Some(rows) = self.messages.rows() {
            summary.messages = rows.len();
            summary.unread_messages = rows.iter().filter(|m| !m.is_read).count();
        }
        if let Some(rows) = self.events.rows() {
            summary.events = rows.len();
            for event in rows {
                *summary
                    .events_by_type
                    .entry(event.event_type.clone())
                    .or_default() += 1;
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::backend::testing::RecordingBackend;
    use crate::scope::RequestScope;

    async fn load<'a>(
        backend: &'a RecordingBackend,
        token: Option<&str>,
    ) -> AdminDashboard<'a> {
        let scope = RequestScope::new();
        let mut dashboard = AdminDashboard::new(backend);
        dashboard.load(token, &scope.handle()).await.unwrap();
        dashboard
    }

    // =========================================================================
    // Authorization
    // =========================================================================

    #[tokio::test]
    async fn missing_session_issues_no_queries() {
        let backend = RecordingBackend::seeded();

        let dashboard = load(&backend, None).await;

        assert_eq!(dashboard.state(), AuthState::Unauthorized);
        assert_eq!(backend.role_calls(), 0);
        assert_eq!(backend.dataset_calls(), 0);
    }

    #[tokio::test]
    async fn unknown_token_is_unauthorized() {
        let backend = RecordingBackend::seeded();

        let dashboard = load(&backend, Some("stale-token")).await;

        assert_eq!(dashboard.state(), AuthState::Unauthorized);
        assert_eq!(backend.role_calls(), 0);
        assert_eq!(backend.dataset_calls(), 0);
    }

    #[tokio::test]
    async fn non_admin_is_unauthorized_without_dataset_queries() {
        let backend = RecordingBackend::seeded();

        let dashboard = load(&backend, Some("user-token")).await;

        assert_eq!(dashboard.state(), AuthState::Unauthorized);
        assert_eq!(backend.role_calls(), 1);
        assert_eq!(backend.dataset_calls(), 0);
        assert_eq!(dashboard.subscribers(), &Section::NotLoaded);
    }

    #[tokio::test]
    async fn auth_failure_is_unauthorized_with_notice() {
        let backend = RecordingBackend {
            fail_auth: true,
            ..RecordingBackend::seeded()
        };

        let dashboard = load(&backend, Some("admin-token")).await;

        assert_eq!(dashboard.state(), AuthState::Unauthorized);
        assert_eq!(dashboard.notices().len(), 1);
        assert_eq!(backend.dataset_calls(), 0);
    }

    // =========================================================================
    // Datasets
    // =========================================================================

    #[tokio::test]
    async fn admin_issues_exactly_three_capped_queries() {
        let backend = RecordingBackend::seeded();

        let dashboard = load(&backend, Some("admin-token")).await;

        assert_eq!(dashboard.state(), AuthState::Authorized);
        assert_eq!(backend.dataset_calls(), 3);
        let mut limits: Vec<u32> = backend
            .last_queries
            .lock()
            .unwrap()
            .iter()
            .map(|q| q.limit)
            .collect();
        limits.sort();
        assert_eq!(limits, vec![200, 200, 300]);
    }

    #[tokio::test]
    async fn sections_are_newest_first() {
        let backend = RecordingBackend::seeded();

        let dashboard = load(&backend, Some("admin-token")).await;

        let ids: Vec<i64> = dashboard
            .subscribers()
            .rows()
            .unwrap()
            .iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[tokio::test]
    async fn one_failed_section_leaves_the_others() {
        let backend = RecordingBackend {
            fail_messages: true,
            ..RecordingBackend::seeded()
        };

        let dashboard = load(&backend, Some("admin-token")).await;

        assert_eq!(backend.dataset_calls(), 3);
        assert!(dashboard.messages().is_failed());
        assert_eq!(dashboard.subscribers().rows().map(<[_]>::len), Some(2));
        assert_eq!(dashboard.events().rows().map(<[_]>::len), Some(3));
        assert_eq!(dashboard.notices().len(), 1);
        assert!(dashboard.notices()[0].message.contains("contact messages"));
    }

    #[tokio::test]
    async fn all_sections_failing_still_queries_three_times() {
        let backend = RecordingBackend {
            fail_subscribers: true,
            fail_messages: true,
            fail_events: true,
            ..RecordingBackend::seeded()
        };

        let dashboard = load(&backend, Some("admin-token")).await;

        assert_eq!(dashboard.state(), AuthState::Authorized);
        assert_eq!(backend.dataset_calls(), 3);
        assert_eq!(dashboard.notices().len(), 3);
    }

    #[tokio::test]
    async fn summary_counts_loaded_rows() {
        let backend = RecordingBackend::seeded();

        let dashboard = load(&backend, Some("admin-token")).await;
        let summary = dashboard.summary();

        assert_eq!(summary.subscribers, 2);
        assert_eq!(summary.messages, 2);
        assert_eq!(summary.unread_messages, 1);
        assert_eq!(summary.events, 3);
        assert_eq!(summary.events_by_type.get("calculation"), Some(&2));
        assert_eq!(summary.events_by_type.get("page_view"), Some(&1));
    }

    // =========================================================================
    // Cancellation
    // =========================================================================

    #[tokio::test]
    async fn cancelled_scope_applies_nothing() {
        let backend = RecordingBackend {
            dataset_delay: Some(Duration::from_secs(30)),
            ..RecordingBackend::seeded()
        };
        let scope = RequestScope::new();
        let handle = scope.handle();
        let mut dashboard = AdminDashboard::new(&backend);

        let (outcome, _) = tokio::join!(dashboard.load(Some("admin-token"), &handle), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            scope.cancel();
        });

        assert_eq!(outcome, Err(Cancelled));
        assert_eq!(dashboard.subscribers(), &Section::NotLoaded);
        assert!(dashboard.notices().is_empty());
    }
}
