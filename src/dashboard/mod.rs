//! Dashboard module
//!
//! Summarises a family's spending and income for one calendar month, with totals per
//! category and per category group.

mod aggregation;
mod handlers;

pub use aggregation::{LabelTotal, MonthlySummary, YearMonth, summarize_month};
pub use handlers::get_dashboard_endpoint;
