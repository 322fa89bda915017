use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::{HxCurrentUrl, HxRedirect};

use crate::{
    Error,
    auth::Identity,
    transaction::{
        FilterCriteria, TransactionFields, TransactionForm, TransactionId, TransactionState,
    },
};

/// A route handler for updating a transaction, redirects to the dashboard on success.
///
/// The ID, creation time and owner of the transaction are kept. The edit page
/// carries the dashboard filters in its query string, so the redirect restores them.
pub async fn edit_transaction_endpoint(
    State(state): State<TransactionState>,
    identity: Option<Extension<Identity>>,
    Path(transaction_id): Path<TransactionId>,
    current_url: HxCurrentUrl,
    Form(form): Form<TransactionForm>,
) -> Response {
    match update_transaction(&state, identity.as_deref(), transaction_id, form).await {
        Ok(()) => (
            HxRedirect(FilterCriteria::from_current_url(&current_url).dashboard_url()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not update transaction {transaction_id}: {error}");
            error.into_alert_response()
        }
    }
}

async fn update_transaction(
    state: &TransactionState,
    identity: Option<&Identity>,
    transaction_id: TransactionId,
    form: TransactionForm,
) -> Result<(), Error> {
    let fields = TransactionFields::try_from(form)?;
    let store = state.store(identity)?;

    store.update(transaction_id, fields, state.now()?).await
}
