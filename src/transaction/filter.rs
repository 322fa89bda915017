//! Narrowing the transaction list down to what the user asked to see.

use axum::http::Uri;
use axum_htmx::HxCurrentUrl;
use serde::{Deserialize, Deserializer};
use time::{Duration, OffsetDateTime};

use crate::{
    endpoints,
    transaction::{Category, Transaction, TransactionType},
};

/// The time window a transaction's date must fall into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// Every transaction regardless of date.
    #[default]
    All,
    /// Transactions dated today.
    Today,
    /// Transactions dated within the last seven days.
    Week,
    /// Transactions in the current calendar month.
    Month,
    /// Transactions in the current calendar year.
    Year,
}

impl Period {
    pub const ALL: [Period; 5] = [
        Period::All,
        Period::Today,
        Period::Week,
        Period::Month,
        Period::Year,
    ];

    /// The value used in the query string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::All => "all",
            Period::Today => "today",
            Period::Week => "week",
            Period::Month => "month",
            Period::Year => "year",
        }
    }

    /// The name shown in the filter drop-down.
    pub fn label(&self) -> &'static str {
        match self {
            Period::All => "All time",
            Period::Today => "Today",
            Period::Week => "Last 7 days",
            Period::Month => "This month",
            Period::Year => "This year",
        }
    }

    fn contains(&self, transaction: &Transaction, now: OffsetDateTime) -> bool {
        let today = now.date();

        match self {
            Period::All => true,
            Period::Today => transaction.date == today,
            Period::Week => {
                let start_of_day = transaction.date.midnight().assume_offset(now.offset());
                start_of_day >= now - Duration::days(7)
            }
            Period::Month => {
                transaction.date.month() == today.month() && transaction.date.year() == today.year()
            }
            Period::Year => transaction.date.year() == today.year(),
        }
    }
}

/// Restricts the list to income or expenses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeFilter {
    /// Both income and expenses.
    #[default]
    All,
    /// Only the given type.
    Only(TransactionType),
}

impl TypeFilter {
    /// The value used in the query string.
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeFilter::All => "all",
            TypeFilter::Only(type_) => type_.as_str(),
        }
    }

    fn parse(value: &str) -> Self {
        match value {
            "income" => TypeFilter::Only(TransactionType::Income),
            "expense" => TypeFilter::Only(TransactionType::Expense),
            _ => TypeFilter::All,
        }
    }
}

impl<'de> Deserialize<'de> for TypeFilter {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(TypeFilter::parse(raw.trim()))
    }
}

/// Restricts the list to one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    /// Every category.
    #[default]
    All,
    /// Only the given category.
    Only(Category),
}

impl CategoryFilter {
    /// The value used in the query string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryFilter::All => "all",
            CategoryFilter::Only(category) => category.as_str(),
        }
    }

    fn parse(value: &str) -> Self {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == value)
            .map_or(CategoryFilter::All, CategoryFilter::Only)
    }
}

impl<'de> Deserialize<'de> for CategoryFilter {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(CategoryFilter::parse(raw.trim()))
    }
}

/// The filter controls on the dashboard, read from the query string, e.g.
/// `?period=month&type=expense&category=food`.
///
/// Missing values mean "all".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    /// The time window.
    pub period: Period,
    /// Income, expense or both.
    #[serde(rename = "type")]
    pub type_: TypeFilter,
    /// A single category or all of them.
    pub category: CategoryFilter,
}

impl FilterCriteria {
    /// Read the filters from the query string of `url`.
    ///
    /// A URL without a query, or with one that cannot be parsed, gives the default filters.
    pub fn from_url(url: &Uri) -> Self {
        url.query()
            .and_then(|query| {
                serde_urlencoded::from_str(query)
                    .inspect_err(|error| tracing::debug!("ignoring filters in {url}: {error}"))
                    .ok()
            })
            .unwrap_or_default()
    }

    /// The filters on the page htmx sent the request from, or the defaults
    /// for requests that did not come from htmx.
    pub fn from_current_url(current_url: &HxCurrentUrl) -> Self {
        current_url
            .0
            .as_ref()
            .map(Self::from_url)
            .unwrap_or_default()
    }

    /// The query string for these filters without the leading '?', leaving out
    /// anything set to "all".
    pub fn query_string(&self) -> String {
        [
            ("period", self.period.as_str()),
            ("type", self.type_.as_str()),
            ("category", self.category.as_str()),
        ]
        .into_iter()
        .filter(|(_, value)| *value != "all")
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
    }

    /// Append these filters to `path`, e.g. `/dashboard?period=month`.
    pub fn apply_to(&self, path: &str) -> String {
        match self.query_string() {
            query if query.is_empty() => path.to_owned(),
            query => format!("{path}?{query}"),
        }
    }

    /// The dashboard showing these filters.
    pub fn dashboard_url(&self) -> String {
        self.apply_to(endpoints::DASHBOARD_VIEW)
    }

    fn matches(&self, transaction: &Transaction, now: OffsetDateTime) -> bool {
        let type_matches = match self.type_ {
            TypeFilter::All => true,
            TypeFilter::Only(type_) => transaction.type_ == type_,
        };

        let category_matches = match self.category {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => transaction.category == category,
        };

        type_matches && category_matches && self.period.contains(transaction, now)
    }
}

/// Get the transactions that match `criteria`, in their original order.
///
/// `now` should be the current time in the user's timezone.
pub fn filter_transactions(
    transactions: &[Transaction],
    criteria: &FilterCriteria,
    now: OffsetDateTime,
) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|transaction| criteria.matches(transaction, now))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use axum::http::Uri;
    use axum_htmx::HxCurrentUrl;
    use time::macros::{date, datetime};

    use crate::transaction::{
        Category, Transaction, TransactionType, core::test_transaction,
    };

    use super::{CategoryFilter, FilterCriteria, Period, TypeFilter, filter_transactions};

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
                Category::Food,
                date!(2023 - 06 - 01),
            ),
        ]
    }

    fn ids(transactions: &[Transaction]) -> Vec<i64> {
        transactions.iter().map(|t| t.id.as_i64()).collect()
    }

    #[test]
    fn all_criteria_returns_everything() {
        let transactions = scenario();

        let got = filter_transactions(
            &transactions,
            &FilterCriteria::default(),
            datetime!(2024-01-20 12:00 UTC),
        );

        assert_eq!(got, transactions);
    }

    #[test]
    fn month_filter_keeps_current_month_in_order() {
        let criteria = FilterCriteria {
            period: Period::Month,
            ..Default::default()
        };

        let got = filter_transactions(&scenario(), &criteria, datetime!(2024-01-20 12:00 UTC));

        assert_eq!(ids(&got), vec![1, 2]);
    }

    #[test]
    fn month_filter_requires_same_year() {
        let transactions = vec![test_transaction(
            1,
            TransactionType::Expense,
            5.0,
            Category::Food,
            date!(2023 - 01 - 20),
        )];
        let criteria = FilterCriteria {
            period: Period::Month,
            ..Default::default()
        };

        let got = filter_transactions(&transactions, &criteria, datetime!(2024-01-20 12:00 UTC));

        assert!(got.is_empty());
    }

    #[test]
    fn today_filter_matches_date_exactly() {
        let transactions = vec![
            test_transaction(
                1,
                TransactionType::Expense,
                5.0,
                Category::Food,
                date!(2024 - 01 - 20),
            ),
            test_transaction(
                2,
                TransactionType::Expense,
                5.0,
                Category::Food,
                date!(2024 - 01 - 19),
            ),
        ];
        let criteria = FilterCriteria {
            period: Period::Today,
            ..Default::default()
        };

        let got = filter_transactions(&transactions, &criteria, datetime!(2024-01-20 23:59 UTC));

        assert_eq!(ids(&got), vec![1]);
    }

    #[test]
    fn week_filter_compares_instants() {
        let transactions = vec![
            // Midnight on the 13th is twelve hours before the window opens.
            test_transaction(
                1,
                TransactionType::Expense,
                5.0,
                Category::Food,
                date!(2024 - 01 - 13),
            ),
            test_transaction(
                2,
                TransactionType::Expense,
                5.0,
                Category::Food,
                date!(2024 - 01 - 14),
            ),
            test_transaction(
                3,
                TransactionType::Expense,
                5.0,
                Category::Food,
                date!(2024 - 01 - 20),
            ),
        ];
        let criteria = FilterCriteria {
            period: Period::Week,
            ..Default::default()
        };

        let got = filter_transactions(&transactions, &criteria, datetime!(2024-01-20 12:00 UTC));

        assert_eq!(ids(&got), vec![2, 3]);
    }

    #[test]
    fn week_filter_is_inclusive_at_the_boundary() {
        let transactions = vec![test_transaction(
            1,
            TransactionType::Expense,
            5.0,
            Category::Food,
            date!(2024 - 01 - 13),
        )];
        let criteria = FilterCriteria {
            period: Period::Week,
            ..Default::default()
        };

        let got = filter_transactions(&transactions, &criteria, datetime!(2024-01-20 00:00 UTC));

        assert_eq!(ids(&got), vec![1]);
    }

    #[test]
    fn year_filter_keeps_current_year() {
        let criteria = FilterCriteria {
            period: Period::Year,
            ..Default::default()
        };

        let got = filter_transactions(&scenario(), &criteria, datetime!(2024-01-20 12:00 UTC));

        assert_eq!(ids(&got), vec![1, 2]);
    }

    #[test]
    fn type_and_category_filters_combine() {
        let criteria = FilterCriteria {
            period: Period::All,
            type_: TypeFilter::Only(TransactionType::Expense),
            category: CategoryFilter::Only(Category::Food),
        };

        let got = filter_transactions(&scenario(), &criteria, datetime!(2024-01-20 12:00 UTC));

        assert_eq!(ids(&got), vec![3]);
    }

    #[test]
    fn filtering_is_idempotent() {
        let criteria = FilterCriteria {
            period: Period::Month,
            type_: TypeFilter::Only(TransactionType::Expense),
            category: CategoryFilter::All,
        };
        let now = datetime!(2024-01-20 12:00 UTC);

        let once = filter_transactions(&scenario(), &criteria, now);
        let twice = filter_transactions(&once, &criteria, now);

        assert_eq!(once, twice);
    }

    #[test]
    fn parses_criteria_from_query_string() {
        let criteria: FilterCriteria =
            serde_html_form::from_str("period=week&type=income&category=health").unwrap();

        assert_eq!(
            criteria,
            FilterCriteria {
                period: Period::Week,
                type_: TypeFilter::Only(TransactionType::Income),
                category: CategoryFilter::Only(Category::Health),
            }
        );
    }

    #[test]
    fn missing_and_all_values_mean_everything() {
        let criteria: FilterCriteria = serde_html_form::from_str("type=all").unwrap();

        assert_eq!(criteria, FilterCriteria::default());
    }

    #[test]
    fn dashboard_url_leaves_out_all_values() {
        let criteria = FilterCriteria {
            period: Period::Month,
            category: CategoryFilter::Only(Category::Food),
            ..Default::default()
        };

        assert_eq!(criteria.dashboard_url(), "/dashboard?period=month&category=food");
        assert_eq!(FilterCriteria::default().dashboard_url(), "/dashboard");
    }

    #[test]
    fn reads_filters_from_the_htmx_current_url() {
        let url: Uri = "http://localhost:3000/dashboard?period=year&type=expense"
            .parse()
            .unwrap();

        let criteria = FilterCriteria::from_current_url(&HxCurrentUrl(Some(url)));

        assert_eq!(
            criteria,
            FilterCriteria {
                period: Period::Year,
                type_: TypeFilter::Only(TransactionType::Expense),
                category: CategoryFilter::All,
            }
        );
        assert_eq!(
            criteria.dashboard_url(),
            "/dashboard?period=year&type=expense"
        );
    }

    #[test]
    fn unreadable_current_url_gives_default_filters() {
        let url: Uri = "/dashboard?period=decade".parse().unwrap();

        assert_eq!(FilterCriteria::from_url(&url), FilterCriteria::default());
        assert_eq!(
            FilterCriteria::from_current_url(&HxCurrentUrl(None)),
            FilterCriteria::default()
        );
    }
}
