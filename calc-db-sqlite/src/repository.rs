use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use calc_core::backend::{BackendError, ListQuery, SiteBackend, SortOrder};
use calc_core::{
    AnalyticsEvent, AuthUser, ContactMessage, NewAnalyticsEvent, Profile, Role, Subscriber,
    UserRole,
};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Decode, Row, Sqlite, Type};
use tracing::{debug, warn};

#[derive(Clone)]
pub struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    /// Opens `connection_string`: a file path (created if missing), a
    /// `sqlite:` URL, or `:memory:`.
    pub async fn new(connection_string: &str) -> Result<Self> {
        let connected = if is_memory(connection_string) {
            // Every connection to :memory: is a separate database.
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(SqliteConnectOptions::from_str("sqlite::memory:")?)
                .await
        } else {
            let options = if connection_string.starts_with("sqlite:") {
                SqliteConnectOptions::from_str(connection_string)
                    .with_context(|| format!("Invalid database URL: {}", connection_string))?
            } else {
                SqliteConnectOptions::new().filename(connection_string)
            };
            SqlitePoolOptions::new()
                .connect_with(options.create_if_missing(true))
                .await
        };

        let pool = connected
            .with_context(|| format!("Failed to connect to database: {}", connection_string))?;
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Load and execute all SQL seed files from the specified directory.
    /// Files are executed in alphabetical order by filename.
    pub async fn run_seeds(
        &self,
        seeds_dir: &Path,
    ) -> Result<()> {
        let mut entries: Vec<_> = std::fs::read_dir(seeds_dir)
            .with_context(|| format!("Failed to read seeds directory '{}'", seeds_dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "sql"))
            .collect();

        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let sql = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read seed file '{}'", path.display()))?;

            sqlx::raw_sql(&sql)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to execute seed file '{}'", path.display()))?;
            debug!(file = %path.display(), "Applied seed file");
        }

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// A view of this backend that only serves admin datasets to
    /// `access_token`'s user when that user holds the admin role.
    pub fn scoped(
        &self,
        access_token: &str,
    ) -> AdminScopedBackend {
        AdminScopedBackend {
            backend: self.clone(),
            access_token: access_token.to_string(),
        }
    }

    pub async fn has_role(
        &self,
        user_id: &str,
        role: Role,
    ) -> Result<bool, BackendError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM user_roles WHERE user_id = ? AND role = ?",
        )
        .bind(user_id)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(unavailable)?;
        Ok(count > 0)
    }
}

fn is_memory(connection_string: &str) -> bool {
    matches!(connection_string, ":memory:" | "sqlite::memory:" | "sqlite://:memory:")
}

fn unavailable(e: sqlx::Error) -> BackendError {
    BackendError::Unavailable(e.to_string())
}

fn get<'r, T>(
    row: &'r SqliteRow,
    column: &str,
) -> Result<T, BackendError>
where
    T: Decode<'r, Sqlite> + Type<Sqlite>,
{
    row.try_get(column)
        .map_err(|e| BackendError::Decode(format!("Failed to get {}: {}", column, e)))
}

fn direction(order: SortOrder) -> &'static str {
    match order {
        SortOrder::NewestFirst => "DESC",
        SortOrder::OldestFirst => "ASC",
    }
}

fn parse_payload(raw: Option<String>) -> Result<Option<serde_json::Value>, BackendError> {
    raw.map(|text| {
        serde_json::from_str(&text)
            .map_err(|e| BackendError::Decode(format!("Invalid analytics payload: {}", e)))
    })
    .transpose()
}

fn row_to_subscriber(row: &SqliteRow) -> Result<Subscriber, BackendError> {
    Ok(Subscriber {
        id: get(row, "id")?,
        email: get(row, "email")?,
        source: get(row, "source")?,
        subscribed_at: get(row, "subscribed_at")?,
    })
}

fn row_to_contact_message(row: &SqliteRow) -> Result<ContactMessage, BackendError> {
    Ok(ContactMessage {
        id: get(row, "id")?,
        name: get(row, "name")?,
        email: get(row, "email")?,
        subject: get(row, "subject")?,
        message: get(row, "message")?,
        is_read: get(row, "is_read")?,
        created_at: get(row, "created_at")?,
    })
}

fn row_to_analytics_event(row: &SqliteRow) -> Result<AnalyticsEvent, BackendError> {
    Ok(AnalyticsEvent {
        id: get(row, "id")?,
        event_type: get(row, "event_type")?,
        page: get(row, "page")?,
        payload: parse_payload(get(row, "payload")?)?,
        created_at: get(row, "created_at")?,
    })
}

#[async_trait]
impl SiteBackend for SqliteBackend {
    async fn current_user(&self, access_token: &str) -> Result<Option<AuthUser>, BackendError> {
        let Some(row) = sqlx::query(
            "SELECT s.user_id, s.expires_at, p.email
             FROM auth_sessions s
             LEFT JOIN profiles p ON p.id = s.user_id
             WHERE s.token = ?",
        )
        .bind(access_token)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?
        else {
            return Ok(None);
        };

        let expires_at: DateTime<Utc> = get(&row, "expires_at")?;
        if expires_at <= Utc::now() {
            debug!("Session token has expired");
            return Ok(None);
        }

        Ok(Some(AuthUser {
            id: get(&row, "user_id")?,
            email: get(&row, "email")?,
        }))
    }

    async fn roles_for_user(&self, user_id: &str) -> Result<Vec<UserRole>, BackendError> {
        let rows = sqlx::query("SELECT id, user_id, role FROM user_roles WHERE user_id = ? ORDER BY id")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unavailable)?;

        rows.iter()
            .map(|row| {
                let role: String = get(row, "role")?;
                Ok(UserRole {
                    id: get(row, "id")?,
                    user_id: get(row, "user_id")?,
                    role: Role::parse(&role)
                        .ok_or_else(|| BackendError::Decode(format!("Unknown role '{}'", role)))?,
                })
            })
            .collect()
    }

    async fn get_profile(&self, user_id: &str) -> Result<Profile, BackendError> {
        let row = sqlx::query("SELECT id, email, display_name, created_at FROM profiles WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?
            .ok_or(BackendError::NotFound)?;

        Ok(Profile {
            id: get(&row, "id")?,
            email: get(&row, "email")?,
            display_name: get(&row, "display_name")?,
            created_at: get(&row, "created_at")?,
        })
    }

    async fn list_subscribers(&self, query: &ListQuery) -> Result<Vec<Subscriber>, BackendError> {
        let sql = format!(
            "SELECT id, email, source, subscribed_at FROM newsletter_subscribers
             ORDER BY subscribed_at {dir}, id {dir} LIMIT ?",
            dir = direction(query.order)
        );
        let rows = sqlx::query(&sql)
            .bind(i64::from(query.limit))
            .fetch_all(&self.pool)
            .await
            .map_err(unavailable)?;

        rows.iter().map(row_to_subscriber).collect()
    }

    async fn list_contact_messages(
        &self,
        query: &ListQuery,
    ) -> Result<Vec<ContactMessage>, BackendError> {
        let sql = format!(
            "SELECT id, name, email, subject, message, is_read, created_at FROM contact_messages
             ORDER BY created_at {dir}, id {dir} LIMIT ?",
            dir = direction(query.order)
        );
        let rows = sqlx::query(&sql)
            .bind(i64::from(query.limit))
            .fetch_all(&self.pool)
            .await
            .map_err(unavailable)?;

        rows.iter().map(row_to_contact_message).collect()
    }

    async fn list_analytics_events(
        &self,
        query: &ListQuery,
    ) -> Result<Vec<AnalyticsEvent>, BackendError> {
        let sql = format!(
            "SELECT id, event_type, page, payload, created_at FROM analytics_logs
             ORDER BY created_at {dir}, id {dir} LIMIT ?",
            dir = direction(query.order)
        );
        let rows = sqlx::query(&sql)
            .bind(i64::from(query.limit))
            .fetch_all(&self.pool)
            .await
            .map_err(unavailable)?;

        rows.iter().map(row_to_analytics_event).collect()
    }

    async fn record_analytics_event(
        &self,
        event: NewAnalyticsEvent,
    ) -> Result<AnalyticsEvent, BackendError> {
        let created_at = Utc::now();
        let payload = event.payload.as_ref().map(|p| p.to_string());

        let result = sqlx::query(
            "INSERT INTO analytics_logs (event_type, page, payload, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&event.event_type)
        .bind(&event.page)
        .bind(&payload)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(AnalyticsEvent {
            id: result.last_insert_rowid(),
            event_type: event.event_type,
            page: event.page,
            payload: event.payload,
            created_at,
        })
    }
}

/// Enforces the admin role on dataset reads for one session. The dashboard
/// checks roles too, but only to decide what to render; this is the check
/// that protects the rows.
pub struct AdminScopedBackend {
    backend: SqliteBackend,
    access_token: String,
}

impl AdminScopedBackend {
    async fn require_admin(&self) -> Result<(), BackendError> {
        let user = self
            .backend
            .current_user(&self.access_token)
            .await?
            .ok_or(BackendError::Unauthorized)?;
        if self.backend.has_role(&user.id, Role::Admin).await? {
            Ok(())
        } else {
            warn!(user_id = %user.id, "Rejected admin dataset read");
            Err(BackendError::Unauthorized)
        }
    }
}

#[async_trait]
impl SiteBackend for AdminScopedBackend {
    async fn current_user(&self, access_token: &str) -> Result<Option<AuthUser>, BackendError> {
        self.backend.current_user(access_token).await
    }

    async fn roles_for_user(&self, user_id: &str) -> Result<Vec<UserRole>, BackendError> {
        self.backend.roles_for_user(user_id).await
    }

    async fn get_profile(&self, user_id: &str) -> Result<Profile, BackendError> {
        self.backend.get_profile(user_id).await
    }

    async fn list_subscribers(&self, query: &ListQuery) -> Result<Vec<Subscriber>, BackendError> {
        self.require_admin().await?;
        self.backend.list_subscribers(query).await
    }

    async fn list_contact_messages(
        &self,
        query: &ListQuery,
    ) -> Result<Vec<ContactMessage>, BackendError> {
        self.require_admin().await?;
        self.backend.list_contact_messages(query).await
    }

    async fn list_analytics_events(
        &self,
        query: &ListQuery,
    ) -> Result<Vec<AnalyticsEvent>, BackendError> {
        self.require_admin().await?;
        self.backend.list_analytics_events(query).await
    }

    async fn record_analytics_event(
        &self,
        event: NewAnalyticsEvent,
    ) -> Result<AnalyticsEvent, BackendError> {
        self.backend.record_analytics_event(event).await
    }
}
