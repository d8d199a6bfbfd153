//! Recurring spending rules and the monthly materializer that posts them.
//!
//! A rule describes spending that happens every month on a given day. Once that day has
//! arrived, [process_due] posts one concrete transaction for the rule and marks the rule as
//! processed for the month, so later runs in the same month do nothing.

mod create;
mod db;
mod delete;
mod list;
mod materializer;
mod models;
mod process;
mod schedule;
mod scheduler;
mod store;

pub use create::create_rule_endpoint;
pub use db::{
    claim_rule_for_month, create_recurring_rule_table, create_rule, deactivate_rule, get_rule,
    list_active_rules, list_active_rules_for_family,
};
pub use delete::delete_rule_endpoint;
pub use list::list_rules_endpoint;
pub use materializer::{MaterializationResult, process_due};
pub use models::{DayOfMonth, NewRecurringRule, RECURRING_MEMO_PREFIX, RecurringRule};
pub use process::process_recurring_endpoint;
pub use schedule::{ShortMonthPolicy, is_due};
pub use scheduler::spawn_recurring_scheduler;
pub use store::{RecurringStore, SqliteRecurringStore};
