use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::{
    ApiResponse, Error,
    app_state::lock_connection,
    category::SpendingCategory,
    family::{FamilyCode, UserName, find_or_create_family},
    payment_method::PaymentMethod,
    recurring::{
        db::create_rule,
        models::{DayOfMonth, NewRecurringRule, RecurringRule, RecurringState},
    },
    transaction::{Amount, Memo},
};

/// The request body for creating a recurring rule.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRuleRequest {
    /// The amount of each posted transaction.
    pub amount: Option<i64>,
    /// The spending category label, e.g. "주거비 - 월세/관리비".
    pub category: Option<String>,
    /// The member the posted transactions are recorded for.
    pub user_name: Option<String>,
    /// The family the rule belongs to.
    pub family_code: Option<String>,
    /// The day of the month the rule becomes due, from 1 to 31.
    pub day_of_month: Option<i64>,
    /// An optional note.
    pub memo: Option<String>,
    /// One of "card", "cash" or "transfer", defaults to "card".
    pub payment_method: Option<String>,
}

impl CreateRuleRequest {
    fn validate(self) -> Result<NewRecurringRule, Error> {
        let amount = self.amount.ok_or(Error::MissingField("amount"))?;
        let category = self.category.ok_or(Error::MissingField("category"))?;
        let user_name = self.user_name.ok_or(Error::MissingField("userName"))?;
        let family_code = self.family_code.ok_or(Error::MissingField("familyCode"))?;
        let day_of_month = self
            .day_of_month
            .ok_or(Error::MissingField("dayOfMonth"))?;

        Ok(NewRecurringRule {
            amount: Amount::new(amount)?,
            category: category.parse::<SpendingCategory>()?,
            memo: Memo::parse_optional(self.memo.as_deref())?,
            user_name: UserName::new(&user_name)?,
            family_code: FamilyCode::new(&family_code)?,
            day_of_month: DayOfMonth::new(day_of_month)?,
            payment_method: match self.payment_method.as_deref() {
                Some(payment_method) => payment_method.parse()?,
                None => PaymentMethod::default(),
            },
        })
    }
}

/// A route handler for creating a recurring rule.
pub async fn create_rule_endpoint(
    State(state): State<RecurringState>,
    body: Result<Json<CreateRuleRequest>, JsonRejection>,
) -> Response {
    match create(&state, body) {
        Ok(rule) => (StatusCode::CREATED, ApiResponse::success(rule)).into_response(),
        Err(error) => error.into_response(),
    }
}

fn create(
    state: &RecurringState,
    body: Result<Json<CreateRuleRequest>, JsonRejection>,
) -> Result<RecurringRule, Error> {
    let Json(request) = body.map_err(|rejection| Error::InvalidRequest(rejection.body_text()))?;
    let new_rule = request.validate()?;

    let connection = lock_connection(&state.db_connection)?;
    find_or_create_family(&new_rule.family_code, &new_rule.user_name, &connection)?;
    create_rule(new_rule, &connection)
}
