//! Runs the materializer in the background on a fixed interval.

use std::time::Duration;

use axum::extract::FromRef;
use tokio::{
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};

use crate::{
    AppState,
    recurring::{models::RecurringState, process::run_materializer},
};

/// Spawn a task that posts due recurring rules every `period`, starting immediately.
///
/// Runs alongside the HTTP trigger, the monthly claim keeps the two from double posting.
pub fn spawn_recurring_scheduler(state: &AppState, period: Duration) -> JoinHandle<()> {
    let state = RecurringState::from_ref(state);

    tokio::spawn(async move {
        let mut interval = interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            match run_materializer(&state) {
                Ok(result) => tracing::debug!(
                    "Scheduled recurring run posted {} rules, {} failed",
                    result.processed,
                    result.failed
                ),
                Err(error) => tracing::error!("Scheduled recurring run failed: {error}"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rusqlite::Connection;

    use crate::{
        AppState,
        category::SpendingCategory,
        family::{FamilyCode, UserName},
        payment_method::PaymentMethod,
        recurring::{
            db::{create_rule, get_rule},
            models::{DayOfMonth, NewRecurringRule},
            schedule::ShortMonthPolicy,
        },
        transaction::Amount,
    };

    use super::spawn_recurring_scheduler;

    #[tokio::test]
    async fn first_run_happens_on_start() {
        let state = AppState::new(
            Connection::open_in_memory().unwrap(),
            "Asia/Seoul",
            ShortMonthPolicy::Skip,
        )
        .unwrap();
        let rule_id = {
            let connection = state.db_connection.lock().unwrap();
            create_rule(
                NewRecurringRule {
                    amount: Amount::new_unchecked(4_900),
                    category: SpendingCategory::EducationOnline,
                    memo: None,
                    user_name: UserName::new_unchecked("민지"),
                    family_code: FamilyCode::new_unchecked("park77"),
                    day_of_month: DayOfMonth::new_unchecked(1),
                    payment_method: PaymentMethod::Card,
                },
                &connection,
            )
            .unwrap()
            .id
        };

        let handle = spawn_recurring_scheduler(&state, Duration::from_secs(3600));

        let mut processed = false;
        for _ in 0..100 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let connection = state.db_connection.lock().unwrap();
            if get_rule(rule_id, &connection).unwrap().last_processed.is_some() {
                processed = true;
                break;
            }
        }
        handle.abort();

        assert!(processed, "the scheduler did not post the due rule");
    }
}
