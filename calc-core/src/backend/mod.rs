pub mod factory;
pub mod repository;

#[cfg(test)]
pub(crate) mod testing;

pub use factory::{BackendConfig, BackendFactory, BackendRegistry};
pub use repository::{BackendError, ContentGenerator, ListQuery, SiteBackend, SortOrder};
