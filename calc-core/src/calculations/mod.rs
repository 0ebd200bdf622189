//! Formula modules behind every calculator page.
//!
//! Each submodule exposes plain functions over typed inputs (usable and
//! testable on their own) plus the [`Calculator`](crate::calculator::Calculator)
//! adapters that map form fields onto them.

pub mod common;
pub mod conversion;
pub mod finance;
pub mod health;
pub mod math;
pub mod science;
pub mod tax;
