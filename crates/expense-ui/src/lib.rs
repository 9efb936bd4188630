//! Presentation layer for the expense dashboard.
//!
//! Turns a computed dashboard report into aligned plain-text tables or a
//! JSON document.

pub mod report_view;
pub mod table_view;

pub use expense_core as core;
