//! Decides whether a recurring rule is due on a given day.

use serde::{Deserialize, Serialize};
use time::Date;

use crate::recurring::models::RecurringRule;

/// How a rule is handled in months that do not have its day, e.g. day 31 in April.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ShortMonthPolicy {
    /// The rule is not posted in months without its day.
    #[default]
    Skip,
    /// The rule is posted on the last day of months without its day.
    LastDay,
}

/// The day of `today`'s month on which `rule` becomes due.
///
/// Under [ShortMonthPolicy::Skip] this may be past the end of the month, in which case the
/// rule is never due that month.
pub fn due_day(rule: &RecurringRule, today: Date, policy: ShortMonthPolicy) -> u8 {
    let day = rule.day_of_month.get();

    match policy {
        ShortMonthPolicy::Skip => day,
        ShortMonthPolicy::LastDay => day.min(today.month().length(today.year())),
    }
}

/// Whether `rule` was already posted in the calendar month of `today`.
pub fn processed_this_month(rule: &RecurringRule, today: Date) -> bool {
    rule.last_processed.is_some_and(|last_processed| {
        last_processed.year() == today.year() && last_processed.month() == today.month()
    })
}

/// Whether `rule` should be posted on `today`.
///
/// A rule is due once its day of the month has arrived, as long as it is active and has not
/// been posted yet this month.
pub fn is_due(rule: &RecurringRule, today: Date, policy: ShortMonthPolicy) -> bool {
    rule.is_active
        && today.day() >= due_day(rule, today, policy)
        && !processed_this_month(rule, today)
}
