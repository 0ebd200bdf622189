//! SQLite stand-in for the hosted site backend: sessions, role assignments,
//! newsletter subscribers, contact messages and the analytics log.

pub mod factory;
pub mod repository;

pub use factory::SqliteBackendFactory;
pub use repository::{AdminScopedBackend, SqliteBackend};
