use std::path::Path;

use calc_core::admin::{AdminDashboard, AuthState, DashboardLimits};
use calc_core::backend::ListQuery;
use calc_core::page::{ChannelObserver, forward_analytics};
use calc_core::{CalculatorPage, Catalog, RequestScope, SiteBackend};
use calc_db_sqlite::SqliteBackend;
use pretty_assertions::assert_eq;

async fn seeded_backend() -> SqliteBackend {
    let backend = SqliteBackend::new(":memory:")
        .await
        .expect("Failed to open in-memory database");
    backend
        .run_migrations()
        .await
        .expect("Failed to run migrations");
    backend
        .run_seeds(Path::new("./seeds"))
        .await
        .expect("Failed to run seeds");
    backend
}

#[tokio::test]
async fn admin_session_loads_every_section() {
    let backend = seeded_backend().await;
    let scoped = backend.scoped("dev-admin-token");
    let scope = RequestScope::new();
    let mut dashboard = AdminDashboard::new(&scoped);

    let state = dashboard
        .load(Some("dev-admin-token"), &scope.handle())
        .await
        .unwrap();

    assert_eq!(state, AuthState::Authorized);
    let summary = dashboard.summary();
    assert_eq!(summary.subscribers, 2);
    assert_eq!(summary.unread_messages, 1);
    assert_eq!(summary.events_by_type.get("calculation"), Some(&2));
    assert!(dashboard.notices().is_empty());
}

#[tokio::test]
async fn editor_session_is_turned_away() {
    let backend = seeded_backend().await;
    let scoped = backend.scoped("dev-editor-token");
    let scope = RequestScope::new();
    let mut dashboard = AdminDashboard::new(&scoped);

    let state = dashboard
        .load(Some("dev-editor-token"), &scope.handle())
        .await
        .unwrap();

    assert_eq!(state, AuthState::Unauthorized);
    assert!(dashboard.subscribers().rows().is_none());
}

#[tokio::test]
async fn dashboard_limits_cap_rows() {
    let backend = seeded_backend().await;
    let scope = RequestScope::new();
    let limits = DashboardLimits {
        subscribers: 1,
        messages: 1,
        analytics: 2,
    };
    let mut dashboard = AdminDashboard::with_limits(&backend, limits);

    dashboard
        .load(Some("dev-admin-token"), &scope.handle())
        .await
        .unwrap();

    let subscribers = dashboard.subscribers().rows().unwrap();
    assert_eq!(subscribers.len(), 1);
    assert_eq!(subscribers[0].email, "reader2@example.com");
    assert_eq!(dashboard.events().rows().map(<[_]>::len), Some(2));
}

#[tokio::test]
async fn successful_calculations_land_in_analytics_log() {
    let backend = seeded_backend().await;
    let catalog = Catalog::builtin();
    let (observer, receiver) = ChannelObserver::new(16);
    {
        let mut page = CalculatorPage::new(catalog.require("bmi").unwrap());
        page.add_observer(Box::new(observer));
        page.set_input("weight", "70");
        page.set_input("height", "175");
        page.calculate().unwrap();
        page.set_input("height", "abc");
        assert!(page.calculate().is_err());
    }

    let stored = forward_analytics(&backend, receiver).await;

    assert_eq!(stored, 1);
    let events = backend
        .list_analytics_events(&ListQuery::newest(1))
        .await
        .unwrap();
    assert_eq!(events[0].event_type, "calculation");
    assert_eq!(events[0].page.as_deref(), Some("/calculators/bmi"));
}
