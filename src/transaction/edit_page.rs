use axum::{
    Extension,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    Error,
    auth::Identity,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, BUTTON_SECONDARY_STYLE, FORM_CONTAINER_STYLE, base,
        dollar_input_styles, loading_spinner,
    },
    navigation::NavBar,
    transaction::{
        FilterCriteria, Transaction, TransactionFormDefaults, TransactionId, TransactionState,
        transaction_form_fields,
    },
};

fn edit_transaction_view(
    transaction: &Transaction,
    criteria: &FilterCriteria,
    signed_in_as: Option<&str>,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::EDIT_TRANSACTION_VIEW, signed_in_as).into_html();
    let update_endpoint = format_endpoint(endpoints::TRANSACTION, transaction.id.as_i64());
    let defaults = TransactionFormDefaults::from_transaction(transaction);

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            div class="w-full max-w-md space-y-4"
            {
                h1 class="text-xl font-bold leading-tight tracking-tight text-gray-900 md:text-2xl dark:text-white"
                {
                    "Edit Transaction"
                }

                form
                    hx-put=(update_endpoint)
                    hx-target-error="#alert-container"
                    hx-indicator="#indicator"
                    hx-disabled-elt="#submit-button"
                    class="w-full space-y-4"
                {
                    (transaction_form_fields(&defaults))

                    button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
                    {
                        span class="inline htmx-indicator" id="indicator"
                        {
                            (loading_spinner())
                        }
                        "Save changes"
                    }
                }

                a href=(criteria.dashboard_url()) class=(BUTTON_SECONDARY_STYLE)
                {
                    "Cancel"
                }
            }
        }
    };

    base("Edit Transaction", &[dollar_input_styles()], &content)
}

/// Renders the page for editing a transaction, or the 404 page if it does not exist.
///
/// The query string holds the dashboard filters to return to.
pub async fn get_edit_transaction_page(
    State(state): State<TransactionState>,
    identity: Option<Extension<Identity>>,
    Path(transaction_id): Path<TransactionId>,
    Query(criteria): Query<FilterCriteria>,
) -> Response {
    let identity = identity.as_deref();

    let transaction = match state
        .store(identity)
        .and_then(|store| store.get(transaction_id))
    {
        Ok(transaction) => transaction,
        Err(Error::NotFound) => {
            tracing::debug!("Tried to edit missing transaction {transaction_id}");
            return Error::NotFound.into_response();
        }
        Err(error) => {
            tracing::error!("Failed to retrieve transaction {transaction_id}: {error}");
            return error.into_response();
        }
    };

    edit_transaction_view(
        &transaction,
        &criteria,
        identity.map(|identity| identity.email.as_str()),
    )
    .into_response()
}
