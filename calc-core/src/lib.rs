pub mod admin;
pub mod backend;
pub mod calculations;
pub mod calculator;
pub mod content;
pub mod error;
pub mod models;
pub mod page;
pub mod presentation;
pub mod scope;
pub mod seo;
pub mod validation;

pub use backend::{BackendConfig, BackendError, BackendRegistry, ContentGenerator, SiteBackend};
pub use calculator::{Catalog, Calculator, CalculatorMeta, Category, run};
pub use error::{CalcError, CalcResult, ValidationError};
pub use models::*;
pub use page::CalculatorPage;
pub use scope::{Cancelled, RequestScope, ScopeHandle};
