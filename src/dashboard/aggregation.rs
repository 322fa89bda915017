//! Totals, category breakdowns and monthly series for the dashboard cards and charts.

use time::{Date, Month};

use crate::transaction::{Transaction, TransactionType};

/// Income, expenses and what is left over.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Summary {
    pub income: f64,
    pub expense: f64,
    /// `income - expense`.
    pub balance: f64,
}

/// Whether the balance is above, below or exactly zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceStatus {
    Positive,
    Negative,
    Balanced,
}

impl BalanceStatus {
    pub fn label(&self) -> &'static str {
        match self {
            BalanceStatus::Positive => "Positive",
            BalanceStatus::Negative => "Negative",
            BalanceStatus::Balanced => "Balanced",
        }
    }
}

impl Summary {
    pub fn status(&self) -> BalanceStatus {
        if self.balance > 0.0 {
            BalanceStatus::Positive
        } else if self.balance < 0.0 {
            BalanceStatus::Negative
        } else {
            BalanceStatus::Balanced
        }
    }
}

/// Add up income and expenses.
pub fn summarize(transactions: &[Transaction]) -> Summary {
    let (income, expense) =
        transactions
            .iter()
            .fold((0.0, 0.0), |(income, expense), transaction| {
                match transaction.type_ {
                    TransactionType::Income => (income + transaction.amount, expense),
                    TransactionType::Expense => (income, expense + transaction.amount),
                }
            });

    Summary {
        income,
        expense,
        balance: income - expense,
    }
}

/// The transactions dated in the same calendar month and year as `today`.
pub fn current_month(transactions: &[Transaction], today: Date) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|transaction| {
            transaction.date.year() == today.year() && transaction.date.month() == today.month()
        })
        .cloned()
        .collect()
}

/// The expense total for one category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    /// The category's display label.
    pub label: &'static str,
    pub total: f64,
}

/// Sum expenses by category.
///
/// Income is ignored. Categories appear in the order they are first seen in
/// `transactions`.
pub fn category_breakdown(transactions: &[Transaction]) -> Vec<CategoryTotal> {
    let mut totals: Vec<CategoryTotal> = Vec::new();

    for transaction in transactions
        .iter()
        .filter(|transaction| transaction.type_ == TransactionType::Expense)
    {
        let label = transaction.category.label();

        match totals.iter_mut().find(|total| total.label == label) {
            Some(total) => total.total += transaction.amount,
            None => totals.push(CategoryTotal {
                label,
                total: transaction.amount,
            }),
        }
    }

    totals
}

/// The number of calendar months shown in the monthly chart.
pub const MONTHS_IN_SERIES: usize = 6;

/// Income and expense totals for one calendar month.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyTotals {
    pub year: i32,
    pub month: Month,
    pub income: f64,
    pub expense: f64,
}

impl MonthlyTotals {
    fn empty(year: i32, month: Month) -> Self {
        Self {
            year,
            month,
            income: 0.0,
            expense: 0.0,
        }
    }

    /// A short label such as "Jan 2024".
    pub fn label(&self) -> String {
        let month = match self.month {
            Month::January => "Jan",
            Month::February => "Feb",
            Month::March => "Mar",
            Month::April => "Apr",
            Month::May => "May",
            Month::June => "Jun",
            Month::July => "Jul",
            Month::August => "Aug",
            Month::September => "Sep",
            Month::October => "Oct",
            Month::November => "Nov",
            Month::December => "Dec",
        };

        format!("{month} {}", self.year)
    }
}

/// Income and expense totals for the six calendar months ending with the
/// month of `today`, oldest first.
///
/// Every month is present even when it has no transactions. Transactions
/// outside the window are ignored.
pub fn monthly_series(
    transactions: &[Transaction],
    today: Date,
) -> [MonthlyTotals; MONTHS_IN_SERIES] {
    let mut series = [MonthlyTotals::empty(today.year(), today.month()); MONTHS_IN_SERIES];

    let (mut year, mut month) = (today.year(), today.month());
    for bucket in series.iter_mut().rev() {
        *bucket = MonthlyTotals::empty(year, month);

        if month == Month::January {
            year -= 1;
        }
        month = month.previous();
    }

    for transaction in transactions {
        let Some(bucket) = series.iter_mut().find(|bucket| {
            bucket.year == transaction.date.year() && bucket.month == transaction.date.month()
        }) else {
            continue;
        };

        match transaction.type_ {
            TransactionType::Income => bucket.income += transaction.amount,
            TransactionType::Expense => bucket.expense += transaction.amount,
        }
    }

    series
}

#[cfg(test)]
mod tests {
    use time::{Month, macros::date};

    use crate::transaction::{Category, Transaction, TransactionType, core::test_transaction};

    use super::{
        BalanceStatus, CategoryTotal, MONTHS_IN_SERIES, Summary, category_breakdown,
        current_month, monthly_series, summarize,
    };

    fn scenario() -> Vec<Transaction> {
        vec![
            test_transaction(
                1,
                TransactionType::Income,
                100.0,
                Category::Other,
                date!(2024 - 01 - 10),
            ),
            test_transaction(
                2,
                TransactionType::Expense,
                40.0,
                Category::Other,
                date!(2024 - 01 - 15),
            ),
            test_transaction(
                3,
                TransactionType::Expense,
                15.0,
                Category::Other,
                date!(2023 - 06 - 01),
            ),
        ]
    }

    #[test]
    fn empty_summary_is_zero_and_balanced() {
        let summary = summarize(&[]);

        assert_eq!(summary, Summary::default());
        assert_eq!(summary.status(), BalanceStatus::Balanced);
    }

    #[test]
    fn current_month_summary() {
        let this_month = current_month(&scenario(), date!(2024 - 01 - 20));

        let summary = summarize(&this_month);

        assert_eq!(
            summary,
            Summary {
                income: 100.0,
                expense: 40.0,
                balance: 60.0
            }
        );
        assert_eq!(summary.status(), BalanceStatus::Positive);
    }

    #[test]
    fn negative_balance_status() {
        let transactions = vec![test_transaction(
            1,
            TransactionType::Expense,
            10.0,
            Category::Food,
            date!(2024 - 01 - 10),
        )];

        assert_eq!(summarize(&transactions).status(), BalanceStatus::Negative);
    }

    #[test]
    fn breakdown_sums_expenses_only() {
        let breakdown = category_breakdown(&scenario());

        assert_eq!(
            breakdown,
            vec![CategoryTotal {
                label: "Other",
                total: 55.0
            }]
        );
    }

    #[test]
    fn breakdown_keeps_first_occurrence_order() {
        let transactions = vec![
            test_transaction(
                1,
                TransactionType::Expense,
                5.0,
                Category::Transport,
                date!(2024 - 01 - 10),
            ),
            test_transaction(
                2,
                TransactionType::Expense,
                20.0,
                Category::Food,
                date!(2024 - 01 - 11),
            ),
            test_transaction(
                3,
                TransactionType::Expense,
                2.5,
                Category::Transport,
                date!(2024 - 01 - 12),
            ),
        ];

        let breakdown = category_breakdown(&transactions);

        assert_eq!(
            breakdown,
            vec![
                CategoryTotal {
                    label: "Transport",
                    total: 7.5
                },
                CategoryTotal {
                    label: "Food",
                    total: 20.0
                },
            ]
        );
        let expense_total: f64 = breakdown.iter().map(|total| total.total).sum();
        assert_eq!(expense_total, summarize(&transactions).expense);
    }

    #[test]
    fn series_has_six_zero_filled_months_oldest_first() {
        let series = monthly_series(&[], date!(2024 - 01 - 20));

        assert_eq!(series.len(), MONTHS_IN_SERIES);
        let labels: Vec<String> = series.iter().map(|month| month.label()).collect();
        assert_eq!(
            labels,
            vec![
                "Aug 2023", "Sep 2023", "Oct 2023", "Nov 2023", "Dec 2023", "Jan 2024"
            ]
        );
        assert!(
            series
                .iter()
                .all(|month| month.income == 0.0 && month.expense == 0.0)
        );
    }

    #[test]
    fn series_excludes_transactions_outside_the_window() {
        let series = monthly_series(&scenario(), date!(2024 - 01 - 20));

        let january = series[MONTHS_IN_SERIES - 1];
        assert_eq!(january.month, Month::January);
        assert_eq!(january.income, 100.0);
        assert_eq!(january.expense, 40.0);

        let total_expense: f64 = series.iter().map(|month| month.expense).sum();
        assert_eq!(total_expense, 40.0);
    }
}
