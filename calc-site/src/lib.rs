//! Offline sitemap generation for the calculator site.

pub mod routes;
pub mod writer;

pub use routes::{StaticRoute, build_sitemap, static_routes};
pub use writer::{SiteError, load_manifest, write_sitemap};
