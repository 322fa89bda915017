//! Dashboard HTTP handlers and view rendering.
//!
//! This module contains:
//! - The route handler for the dashboard page
//! - The route handler for the filtered transaction list fragment
//! - HTML view functions for both
//!
//! The page listens for the `refresh` server-sent event and then re-requests itself, swapping
//! in the summary, list, charts and "last updated" time while leaving the
//! entry form alone.

use axum::{
    Extension,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use axum_htmx::HxPushUrl;
use maud::{Markup, html};
use time::{Date, OffsetDateTime, macros::format_description};

use crate::{
    Error,
    auth::Identity,
    dashboard::{
        aggregation::{Summary, category_breakdown, current_month, monthly_series, summarize},
        cards::summary_cards,
        charts::{DashboardChart, chart_container, inline_chart_script},
        events::REFRESH_EVENT,
        list::transaction_table,
    },
    endpoints,
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, CARD_STYLE, ECHARTS_SCRIPT, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, HTMX_SSE_SCRIPT, HeadElement, LINK_STYLE, PAGE_CONTAINER_STYLE,
        base, dollar_input_styles, loading_spinner,
    },
    navigation::NavBar,
    transaction::{
        Category, CategoryFilter, FilterCriteria, Period, Transaction, TransactionFormDefaults,
        TransactionState, TransactionType, TypeFilter, filter_transactions,
        transaction_form_fields,
    },
};

/// The ID of the element the filtered list is swapped into.
const TRANSACTIONS_CONTAINER_ID: &str = "transactions";

/// The elements other than the list that a refresh replaces.
const REFRESHED_ELEMENTS: &str = "#summary,#charts,#last-updated";

/// The filtered list and its category chart.
struct TransactionsSection {
    transactions: Vec<Transaction>,
    category_chart: Option<DashboardChart>,
    show_owner: bool,
    criteria: FilterCriteria,
}

/// Holds all the data needed to render the dashboard.
struct DashboardData {
    today: Date,
    summary: Summary,
    section: TransactionsSection,
    monthly_chart: DashboardChart,
    last_updated: Option<String>,
}

fn build_transactions_section(
    transactions: &[Transaction],
    criteria: &FilterCriteria,
    now: OffsetDateTime,
    show_owner: bool,
) -> TransactionsSection {
    let filtered = filter_transactions(transactions, criteria, now);
    let breakdown = category_breakdown(&filtered);
    let category_chart =
        (!breakdown.is_empty()).then(|| DashboardChart::category_breakdown(&breakdown));

    TransactionsSection {
        transactions: filtered,
        category_chart,
        show_owner,
        criteria: *criteria,
    }
}

/// Fetches and builds all data needed for the dashboard display.
///
/// The summary cards cover the current calendar month regardless of the
/// filters, the monthly chart covers every transaction.
fn build_dashboard_data(
    state: &TransactionState,
    identity: Option<&Identity>,
    criteria: &FilterCriteria,
) -> Result<DashboardData, Error> {
    let store = state.store(identity)?;
    let transactions = store.transactions()?;
    let now = state.now()?;
    let today = now.date();

    let last_updated = store.last_updated().and_then(|last_updated| {
        last_updated
            .to_offset(now.offset())
            .format(format_description!("[hour]:[minute]:[second]"))
            .inspect_err(|error| tracing::warn!("could not format last updated time: {error}"))
            .ok()
    });

    Ok(DashboardData {
        today,
        summary: summarize(&current_month(&transactions, today)),
        section: build_transactions_section(
            &transactions,
            criteria,
            now,
            state.stores.is_live(),
        ),
        monthly_chart: DashboardChart::monthly_series(&monthly_series(&transactions, today)),
        last_updated,
    })
}

/// Display the dashboard for the signed-in user, or for the local snapshot.
pub async fn get_dashboard_page(
    State(state): State<TransactionState>,
    identity: Option<Extension<Identity>>,
    Query(criteria): Query<FilterCriteria>,
) -> Response {
    let identity = identity.as_deref();

    match build_dashboard_data(&state, identity, &criteria) {
        Ok(data) => dashboard_view(
            &data,
            &criteria,
            identity.map(|identity| identity.email.as_str()),
        )
        .into_response(),
        Err(error) => {
            tracing::error!("Could not build the dashboard: {error}");
            error.into_response()
        }
    }
}

/// Render the transaction list and category chart for the filters in the query string.
///
/// The browser's address is updated to the matching dashboard URL, so a reload
/// or a redirect after saving keeps the filters.
pub async fn get_dashboard_transactions(
    State(state): State<TransactionState>,
    identity: Option<Extension<Identity>>,
    Query(criteria): Query<FilterCriteria>,
) -> Response {
    let result = state.store(identity.as_deref()).and_then(|store| {
        Ok(build_transactions_section(
            &store.transactions()?,
            &criteria,
            state.now()?,
            state.stores.is_live(),
        ))
    });

    match result {
        Ok(section) => (
            HxPushUrl(criteria.dashboard_url()),
            transactions_section_view(&section),
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not filter transactions: {error}");
            error.into_alert_response()
        }
    }
}

fn transactions_section_view(section: &TransactionsSection) -> Markup {
    html!(
        div class="grid grid-cols-1 xl:grid-cols-3 gap-4 w-full"
        {
            div class="xl:col-span-2"
            {
                (transaction_table(
                    &section.transactions,
                    section.show_owner,
                    &section.criteria,
                ))
            }

            div class=(CARD_STYLE)
            {
                @match &section.category_chart {
                    Some(chart) => {
                        (chart_container(chart))
                        (inline_chart_script(chart))
                    }
                    None => {
                        p class="py-4 text-center text-gray-500 dark:text-gray-400"
                        {
                            "No expenses to break down."
                        }
                    }
                }
            }
        }
    )
}

fn select_options<'a>(
    options: impl IntoIterator<Item = (&'a str, &'a str)>,
    selected: &str,
) -> Markup {
    html!(
        @for (value, label) in options {
            option value=(value) selected[value == selected] { (label) }
        }
    )
}

fn filter_form(criteria: &FilterCriteria) -> Markup {
    let periods = Period::ALL.map(|period| (period.as_str(), period.label()));
    let types = [
        (TypeFilter::All.as_str(), "All types"),
        (TransactionType::Income.as_str(), TransactionType::Income.label()),
        (TransactionType::Expense.as_str(), TransactionType::Expense.label()),
    ];
    let categories = std::iter::once((CategoryFilter::All.as_str(), "All categories")).chain(
        Category::ALL.map(|category| (category.as_str(), category.label())),
    );

    html!(
        form
            id="filters"
            hx-get=(endpoints::DASHBOARD_TRANSACTIONS)
            hx-target={ "#" (TRANSACTIONS_CONTAINER_ID) }
            hx-target-error="#alert-container"
            hx-swap="innerHTML"
            hx-trigger="change"
            class="grid grid-cols-1 sm:grid-cols-3 gap-4 w-full"
        {
            div
            {
                label for="period" class=(FORM_LABEL_STYLE) { "Period" }
                select id="period" name="period" class=(FORM_TEXT_INPUT_STYLE)
                {
                    (select_options(periods, criteria.period.as_str()))
                }
            }

            div
            {
                label for="type" class=(FORM_LABEL_STYLE) { "Type" }
                select id="type" name="type" class=(FORM_TEXT_INPUT_STYLE)
                {
                    (select_options(types, criteria.type_.as_str()))
                }
            }

            div
            {
                label for="category-filter" class=(FORM_LABEL_STYLE) { "Category" }
                select id="category-filter" name="category" class=(FORM_TEXT_INPUT_STYLE)
                {
                    (select_options(categories, criteria.category.as_str()))
                }
            }
        }
    )
}

fn entry_form(today: Date) -> Markup {
    html!(
        form
            id="new-transaction"
            hx-post=(endpoints::TRANSACTIONS_API)
            hx-target-error="#alert-container"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="space-y-4"
        {
            h2 class="text-lg font-semibold" { "Add a transaction" }

            (transaction_form_fields(&TransactionFormDefaults::new_expense(today)))

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Add transaction"
            }
        }
    )
}

fn data_tools() -> Markup {
    html!(
        section id="data-tools" class="flex flex-col sm:flex-row sm:items-end gap-4 w-full"
        {
            a href=(endpoints::EXPORT) download class=(LINK_STYLE) { "Export JSON" }

            form
                id="import"
                hx-post=(endpoints::IMPORT)
                hx-encoding="multipart/form-data"
                hx-confirm="Importing replaces all of your current transactions. Continue?"
                hx-target-error="#alert-container"
                class="flex items-end gap-2"
            {
                div
                {
                    label for="import-file" class=(FORM_LABEL_STYLE) { "Import from JSON" }
                    input
                        id="import-file"
                        type="file"
                        name="file"
                        accept=".json,application/json"
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                button type="submit" class=(LINK_STYLE) { "Import" }
            }

            button
                hx-delete=(endpoints::TRANSACTIONS_API)
                hx-confirm="Delete all transactions? This cannot be undone."
                hx-target-error="#alert-container"
                class=(BUTTON_DELETE_STYLE)
            {
                "Clear all data"
            }
        }
    )
}

fn dashboard_view(
    data: &DashboardData,
    criteria: &FilterCriteria,
    signed_in_as: Option<&str>,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW, signed_in_as).into_html();

    let content = html!(
        (nav_bar)

        div
            id="dashboard-content"
            hx-ext="sse"
            sse-connect=(endpoints::DASHBOARD_EVENTS)
            class={ (PAGE_CONTAINER_STYLE) " max-w-screen-xl gap-6" }
        {
            div
                id="live-refresh"
                hidden
                hx-get=(endpoints::DASHBOARD_VIEW)
                hx-include="#filters"
                hx-trigger={ "sse:" (REFRESH_EVENT) }
                hx-select={ "#" (TRANSACTIONS_CONTAINER_ID) }
                hx-target={ "#" (TRANSACTIONS_CONTAINER_ID) }
                hx-swap="outerHTML"
                hx-select-oob=(REFRESHED_ELEMENTS)
            {}

            div class="flex justify-between items-end w-full"
            {
                h1 class="text-xl font-bold" { "Dashboard" }

                span id="last-updated" class="text-sm text-gray-500 dark:text-gray-400"
                {
                    @if let Some(last_updated) = &data.last_updated {
                        "Last updated " (last_updated)
                    }
                }
            }

            (summary_cards(&data.summary))

            div class="grid grid-cols-1 lg:grid-cols-3 gap-6 w-full"
            {
                div class=(CARD_STYLE)
                {
                    (entry_form(data.today))
                }

                div class="lg:col-span-2 flex flex-col gap-4"
                {
                    (filter_form(criteria))

                    div id=(TRANSACTIONS_CONTAINER_ID) class="w-full"
                    {
                        (transactions_section_view(&data.section))
                    }
                }
            }

            section id="charts" class={ (CARD_STYLE) " w-full" }
            {
                (chart_container(&data.monthly_chart))
                (inline_chart_script(&data.monthly_chart))
            }

            (data_tools())
        }
    );

    let head_elements = [
        HeadElement::ScriptLink(ECHARTS_SCRIPT.to_owned()),
        HeadElement::ScriptLink(HTMX_SSE_SCRIPT.to_owned()),
        dollar_input_styles(),
    ];

    base("Dashboard", &head_elements, &content)
}
