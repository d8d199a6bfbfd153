//! Posts the transactions of due recurring rules.

use serde::Serialize;
use time::Date;

use crate::{
    Error,
    recurring::{
        models::RecurringRule,
        schedule::{ShortMonthPolicy, is_due},
        store::RecurringStore,
    },
};

/// The outcome of one [process_due] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MaterializationResult {
    /// The number of rules that had a transaction posted.
    pub processed: usize,
    /// The number of due rules that could not be posted and remain due.
    pub failed: usize,
}

/// Post one transaction for every active rule that is due on `today`.
///
/// Each rule is posted at most once per calendar month, so calling this any number of times
/// is safe. A rule that fails is logged and counted in [MaterializationResult::failed], the
/// remaining rules are still processed.
///
/// # Errors
/// Returns an error only if the active rules cannot be listed.
pub fn process_due<S: RecurringStore>(
    store: &S,
    today: Date,
    policy: ShortMonthPolicy,
) -> Result<MaterializationResult, Error> {
    let rules = store.list_active_rules()?;
    let mut result = MaterializationResult::default();

    for rule in &rules {
        if !is_due(rule, today, policy) {
            tracing::debug!("Recurring rule {} is not due on {today}", rule.id);
            continue;
        }

        match materialize_rule(store, rule, today) {
            Ok(true) => result.processed += 1,
            Ok(false) => {
                tracing::debug!("Recurring rule {} was already posted this month", rule.id);
            }
            Err(error) => {
                tracing::warn!("Could not post recurring rule {}: {error}", rule.id);
                result.failed += 1;
            }
        }
    }

    tracing::info!(
        "Processed recurring rules for {today}: {} of {} active rules posted, {} failed",
        result.processed,
        rules.len(),
        result.failed
    );

    Ok(result)
}

fn materialize_rule<S: RecurringStore>(
    store: &S,
    rule: &RecurringRule,
    today: Date,
) -> Result<bool, Error> {
    store.find_or_create_family(&rule.family_code, &rule.user_name)?;

    match store.materialize(rule, today)? {
        Some(transaction) => {
            tracing::info!(
                "Posted transaction {} of {} for recurring rule {}",
                transaction.id,
                transaction.amount,
                rule.id
            );
            Ok(true)
        }
        None => Ok(false),
    }
}
