//! The transaction table on the dashboard.

use maud::{Markup, html};

use crate::{
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_DELETE_STYLE, CATEGORY_BADGE_STYLE, LINK_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, format_currency,
    },
    transaction::{FilterCriteria, Transaction, TransactionType},
};

/// The part of an email address before the '@'.
fn owner_name(email: &str) -> &str {
    email.split_once('@').map_or(email, |(name, _)| name)
}

fn amount_class(type_: TransactionType) -> &'static str {
    match type_ {
        TransactionType::Income => "text-green-600 dark:text-green-400",
        TransactionType::Expense => "text-red-600 dark:text-red-400",
    }
}

fn transaction_row(
    transaction: &Transaction,
    show_owner: bool,
    criteria: &FilterCriteria,
) -> Markup {
    let edit_url = criteria.apply_to(&format_endpoint(
        endpoints::EDIT_TRANSACTION_VIEW,
        transaction.id.as_i64(),
    ));
    let delete_url = format_endpoint(endpoints::TRANSACTION, transaction.id.as_i64());
    let category = transaction.category;

    html!(
        tr class=(TABLE_ROW_STYLE) data-transaction-id=(transaction.id)
        {
            td class=(TABLE_CELL_STYLE)
            {
                div class="flex items-center gap-2"
                {
                    span aria-hidden="true" { (category.icon()) }
                    span { (transaction.description) }
                }
            }

            td class=(TABLE_CELL_STYLE)
            {
                span class=(CATEGORY_BADGE_STYLE) { (category.label()) }
            }

            td class=(TABLE_CELL_STYLE) { time datetime=(transaction.date) { (transaction.date) } }

            td class={ (TABLE_CELL_STYLE) " text-right font-medium " (amount_class(transaction.type_)) }
            {
                (format_currency(transaction.signed_amount()))
            }

            @if show_owner {
                td class=(TABLE_CELL_STYLE)
                {
                    (transaction.owner_email.as_deref().map(owner_name).unwrap_or_default())
                }
            }

            td class=(TABLE_CELL_STYLE)
            {
                div class="flex gap-4"
                {
                    a href=(edit_url) class=(LINK_STYLE) { "Edit" }

                    button
                        hx-delete=(delete_url)
                        hx-confirm="Are you sure you want to delete this transaction? This cannot be undone."
                        hx-target-error="#alert-container"
                        class=(BUTTON_DELETE_STYLE)
                    {
                        "Delete"
                    }
                }
            }
        }
    )
}

/// A table of `transactions` in the order given.
///
/// `show_owner` adds a column with who created each transaction. The edit
/// links carry `criteria` so saving returns to the same filtered view.
pub(super) fn transaction_table(
    transactions: &[Transaction],
    show_owner: bool,
    criteria: &FilterCriteria,
) -> Markup {
    if transactions.is_empty() {
        return html!(
            p class="py-4 text-center text-gray-500 dark:text-gray-400"
            {
                "No transactions match these filters."
            }
        );
    }

    html!(
        div class="relative overflow-x-auto shadow-md sm:rounded-lg w-full"
        {
            table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                        th scope="col" class={ (TABLE_CELL_STYLE) " text-right" } { "Amount" }
                        @if show_owner {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Added by" }
                        }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                    }
                }

                tbody
                {
                    @for transaction in transactions {
                        (transaction_row(transaction, show_owner, criteria))
                    }
                }
            }
        }
    )
}

#[cfg(test)]
mod tests {
    use scraper::{ElementRef, Html, Selector};
    use time::macros::date;

    use crate::{
        endpoints::{self, format_endpoint},
        transaction::{
            Category, CategoryFilter, FilterCriteria, Period, Transaction, TransactionType,
            core::test_transaction,
        },
    };

    use super::{owner_name, transaction_table};

    fn table(transactions: &[Transaction], show_owner: bool) -> Html {
        let markup = transaction_table(transactions, show_owner, &FilterCriteria::default());

        Html::parse_fragment(&markup.into_string())
    }

    fn rows(html: &Html) -> Vec<ElementRef<'_>> {
        html.select(&Selector::parse("tbody tr").unwrap()).collect()
    }

    fn cells(row: &ElementRef<'_>) -> Vec<String> {
        row.select(&Selector::parse("td").unwrap())
            .map(|cell| {
                cell.text()
                    .map(str::trim)
                    .filter(|text| !text.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }

    fn transactions() -> Vec<Transaction> {
        let mut shared = test_transaction(
            2,
            TransactionType::Expense,
            40.0,
            Category::Food,
            date!(2024 - 01 - 15),
        );
        shared.owner_email = Some("alex@example.com".to_owned());

        vec![
            shared,
            test_transaction(
                1,
                TransactionType::Income,
                1250.0,
                Category::Work,
                date!(2024 - 01 - 10),
            ),
        ]
    }

    #[test]
    fn rows_show_signed_amounts_in_order() {
        let html = table(&transactions(), false);

        let rows = rows(&html);
        assert_eq!(rows.len(), 2);
        assert_eq!(
            cells(&rows[0])[..4],
            ["🍽️ transaction 2", "Food", "2024-01-15", "-$40.00"]
        );
        assert_eq!(
            cells(&rows[1])[..4],
            ["💼 transaction 1", "Work", "2024-01-10", "$1,250.00"]
        );
    }

    #[test]
    fn rows_have_edit_and_delete_actions() {
        let html = table(&transactions(), false);

        let row = &rows(&html)[0];
        let edit = row.select(&Selector::parse("a").unwrap()).next().unwrap();
        assert_eq!(
            edit.value().attr("href"),
            Some(format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, 2).as_str())
        );

        let delete = row.select(&Selector::parse("button").unwrap()).next().unwrap();
        assert_eq!(
            delete.value().attr("hx-delete"),
            Some(format_endpoint(endpoints::TRANSACTION, 2).as_str())
        );
        assert!(delete.value().attr("hx-confirm").is_some());
        // The response redirects, so nothing is swapped in place.
        assert_eq!(delete.value().attr("hx-swap"), None);
    }

    #[test]
    fn edit_links_keep_the_filters() {
        let criteria = FilterCriteria {
            period: Period::Week,
            category: CategoryFilter::Only(Category::Food),
            ..Default::default()
        };
        let markup = transaction_table(&transactions(), false, &criteria);
        let html = Html::parse_fragment(&markup.into_string());

        let edit = rows(&html)[0]
            .select(&Selector::parse("a").unwrap())
            .next()
            .unwrap();
        assert_eq!(
            edit.value().attr("href"),
            Some("/transactions/2/edit?period=week&category=food")
        );
    }

    #[test]
    fn owner_column_only_when_requested() {
        let without = table(&transactions(), false);
        let with = table(&transactions(), true);

        assert_eq!(cells(&rows(&without)[0]).len(), 5);
        let cells = cells(&rows(&with)[0]);
        assert_eq!(cells.len(), 6);
        assert_eq!(cells[4], "alex");
    }

    #[test]
    fn empty_list_shows_message() {
        let html = table(&[], false);

        assert!(rows(&html).is_empty());
        assert!(html.root_element().text().any(|text| text.contains("No transactions")));
    }

    #[test]
    fn owner_name_is_local_part() {
        assert_eq!(owner_name("sam@example.com"), "sam");
        assert_eq!(owner_name("no-at-sign"), "no-at-sign");
    }
}
