//! Monthly totals and category breakdowns.

use std::{collections::HashMap, fmt::Display, str::FromStr};

use serde::Serialize;
use time::{Date, Month, format_description::BorrowedFormatItem, macros::format_description};

use crate::{Error, transaction::Transaction};

const FIRST_OF_MONTH_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

/// A calendar month, written as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: Month,
}

impl YearMonth {
    /// The month containing `date`.
    pub fn of(date: Date) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The first day of the month.
    pub fn first_day(self) -> Date {
        // Day 1 exists in every month.
        Date::from_calendar_date(self.year, self.month, 1).unwrap_or(Date::MIN)
    }

    /// The last day of the month.
    pub fn last_day(self) -> Date {
        let last = self.month.length(self.year);
        Date::from_calendar_date(self.year, self.month, last).unwrap_or(Date::MAX)
    }
}

impl FromStr for YearMonth {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if s.len() != 7 {
            return Err(Error::InvalidMonth(s.to_owned()));
        }

        Date::parse(&format!("{s}-01"), FIRST_OF_MONTH_FORMAT)
            .map(YearMonth::of)
            .map_err(|_| Error::InvalidMonth(s.to_owned()))
    }
}

impl Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month as u8)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The total amount and number of transactions under one label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelTotal {
    /// A category or group label, e.g. "식비 - 외식" or "식비".
    pub label: &'static str,
    /// The sum of the transaction amounts.
    pub total: i64,
    /// The number of transactions.
    pub count: usize,
}

/// A family's spending and income for one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    /// The month summarised.
    pub month: YearMonth,
    /// The sum of all spending.
    pub total_spending: i64,
    /// The sum of all income.
    pub total_income: i64,
    /// Income minus spending.
    pub net: i64,
    /// Spending per category, largest first.
    pub spending_by_category: Vec<LabelTotal>,
    /// Spending per category group, largest first.
    pub spending_by_group: Vec<LabelTotal>,
    /// Income per category, largest first.
    pub income_by_category: Vec<LabelTotal>,
    /// Income per category group, largest first.
    pub income_by_group: Vec<LabelTotal>,
}

/// Summarise `spending` and `income` for `month`.
///
/// Transactions dated outside of `month` are ignored.
pub fn summarize_month(
    month: YearMonth,
    spending: &[Transaction],
    income: &[Transaction],
) -> MonthlySummary {
    let in_month = |transaction: &&Transaction| YearMonth::of(transaction.date) == month;
    let spending: Vec<&Transaction> = spending.iter().filter(in_month).collect();
    let income: Vec<&Transaction> = income.iter().filter(in_month).collect();

    let total_spending = sum(&spending);
    let total_income = sum(&income);

    MonthlySummary {
        month,
        total_spending,
        total_income,
        net: total_income - total_spending,
        spending_by_category: totals_by(&spending, |transaction| transaction.category.label()),
        spending_by_group: totals_by(&spending, |transaction| {
            transaction.category.group_label()
        }),
        income_by_category: totals_by(&income, |transaction| transaction.category.label()),
        income_by_group: totals_by(&income, |transaction| transaction.category.group_label()),
    }
}

fn sum(transactions: &[&Transaction]) -> i64 {
    transactions
        .iter()
        .map(|transaction| transaction.amount.get())
        .sum()
}

/// Totals per label, sorted by descending total and then by label.
fn totals_by(
    transactions: &[&Transaction],
    label_of: impl Fn(&Transaction) -> &'static str,
) -> Vec<LabelTotal> {
    let mut totals: HashMap<&'static str, (i64, usize)> = HashMap::new();

    for transaction in transactions {
        let entry = totals.entry(label_of(transaction)).or_insert((0, 0));
        entry.0 += transaction.amount.get();
        entry.1 += 1;
    }

    let mut totals: Vec<LabelTotal> = totals
        .into_iter()
        .map(|(label, (total, count))| LabelTotal {
            label,
            total,
            count,
        })
        .collect();
    totals.sort_by(|a, b| b.total.cmp(&a.total).then(a.label.cmp(b.label)));

    totals
}

#[cfg(test)]
mod tests {
    use time::{Date, OffsetDateTime, macros::date};

    use crate::{
        Error,
        category::{Category, IncomeCategory, SpendingCategory},
        family::{FamilyCode, UserName},
        payment_method::PaymentMethod,
        transaction::{Amount, Transaction},
    };

    use super::{LabelTotal, YearMonth, summarize_month};

    fn transaction(amount: i64, category: Category, date: Date) -> Transaction {
        Transaction {
            id: 0,
            kind: category.kind(),
            amount: Amount::new_unchecked(amount),
            category,
            memo: None,
            user_name: UserName::new_unchecked("민지"),
            family_code: FamilyCode::new_unchecked("park77"),
            date,
            created_at: OffsetDateTime::UNIX_EPOCH,
            payment_method: PaymentMethod::Card,
            is_recurring: false,
            recurring_id: None,
        }
    }

    fn spend(amount: i64, category: SpendingCategory, date: Date) -> Transaction {
        transaction(amount, Category::Spending(category), date)
    }

    #[test]
    fn parses_year_month() {
        let month: YearMonth = "2025-02".parse().unwrap();

        assert_eq!(month.first_day(), date!(2025 - 02 - 01));
        assert_eq!(month.last_day(), date!(2025 - 02 - 28));
        assert_eq!(month.to_string(), "2025-02");
    }

    #[test]
    fn rejects_bad_months() {
        for text in ["2025-13", "2025-2", "202502", "2025-02-01", "march"] {
            assert_eq!(
                text.parse::<YearMonth>(),
                Err(Error::InvalidMonth(text.to_owned())),
                "{text} should be rejected"
            );
        }
    }

    #[test]
    fn totals_and_net() {
        let month: YearMonth = "2025-03".parse().unwrap();
        let spending = vec![
            spend(12_000, SpendingCategory::FoodDiningOut, date!(2025 - 03 - 02)),
            spend(8_000, SpendingCategory::FoodGroceries, date!(2025 - 03 - 09)),
            spend(30_000, SpendingCategory::TransportFuel, date!(2025 - 03 - 15)),
            spend(99_000, SpendingCategory::TransportFuel, date!(2025 - 04 - 01)),
        ];
        let income = vec![transaction(
            100_000,
            Category::Income(IncomeCategory::SalaryBonus),
            date!(2025 - 03 - 25),
        )];

        let summary = summarize_month(month, &spending, &income);

        assert_eq!(summary.total_spending, 50_000);
        assert_eq!(summary.total_income, 100_000);
        assert_eq!(summary.net, 50_000);
        assert_eq!(
            summary.spending_by_group,
            vec![
                LabelTotal {
                    label: "교통비",
                    total: 30_000,
                    count: 1
                },
                LabelTotal {
                    label: "식비",
                    total: 20_000,
                    count: 2
                },
            ]
        );
        assert_eq!(summary.income_by_category[0].label, "급여 - 보너스");
    }

    #[test]
    fn equal_totals_are_ordered_by_label() {
        let month: YearMonth = "2025-03".parse().unwrap();
        let spending = vec![
            spend(5_000, SpendingCategory::ShoppingMart, date!(2025 - 03 - 02)),
            spend(5_000, SpendingCategory::CafeCoffee, date!(2025 - 03 - 02)),
        ];

        let summary = summarize_month(month, &spending, &[]);

        let labels: Vec<_> = summary
            .spending_by_category
            .iter()
            .map(|total| total.label)
            .collect();
        assert_eq!(labels, vec!["쇼핑 - 마트", "카페 - 커피"]);
        assert_eq!(summary.net, -10_000);
    }
}
