//! Summary cards for the current month's income, expenses and balance.

use maud::{Markup, html};

use crate::{
    dashboard::aggregation::{BalanceStatus, Summary},
    html::{CARD_STYLE, format_currency},
};

fn status_class(status: BalanceStatus) -> &'static str {
    match status {
        BalanceStatus::Positive => "text-green-600 dark:text-green-400",
        BalanceStatus::Negative => "text-red-600 dark:text-red-400",
        BalanceStatus::Balanced => "text-gray-600 dark:text-gray-300",
    }
}

fn card(title: &str, amount: f64, amount_class: &str, footer: Option<&str>) -> Markup {
    html!(
        div class=(CARD_STYLE)
        {
            span class="text-sm text-gray-500 dark:text-gray-400" { (title) }
            span class={ "text-2xl font-semibold " (amount_class) } { (format_currency(amount)) }

            @if let Some(footer) = footer {
                span class={ "text-xs font-medium " (amount_class) } { (footer) }
            }
        }
    )
}

/// Income, expense and balance cards for `summary`.
pub(super) fn summary_cards(summary: &Summary) -> Markup {
    let status = summary.status();

    html!(
        section id="summary" class="grid grid-cols-1 sm:grid-cols-3 gap-4 w-full"
        {
            (card("Income this month", summary.income, status_class(BalanceStatus::Positive), None))
            (card("Expenses this month", summary.expense, status_class(BalanceStatus::Negative), None))
            (card("Balance", summary.balance, status_class(status), Some(status.label())))
        }
    )
}
