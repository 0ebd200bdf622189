mod admin;
mod field;
mod notice;
mod request;
mod result;
mod tax_band;

pub use admin::{
    AnalyticsEvent, AuthUser, ContactMessage, NewAnalyticsEvent, Profile, Role, Subscriber,
    UserRole,
};
pub use field::{FieldConstraints, FieldKind, InputField};
pub use notice::{Notice, NoticeLevel};
pub use request::{CalculationRequest, InputValue};
pub use result::{CalculationResult, ChartKind, ChartPoint, ChartSeries, ResultField, ResultValue};
pub use tax_band::TaxBand;
