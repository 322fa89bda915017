use axum::{
    Extension,
    extract::State,
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

/// A route handler for creating a new transaction, redirects to the dashboard
/// with the filters the user had selected on success.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    identity: Option<Extension<Identity>>,
    current_url: HxCurrentUrl,
    Form(form): Form<TransactionForm>,
) -> Response {
    match create_transaction(&state, identity.as_deref(), form).await {
        Ok(_) => (
            HxRedirect(FilterCriteria::from_current_url(&current_url).dashboard_url()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not create transaction: {error}");
            error.into_alert_response()
        }
    }
}

async fn create_transaction(
    state: &TransactionState,
    identity: Option<&Identity>,
    form: TransactionForm,
) -> Result<TransactionId, Error> {
    let fields = TransactionFields::try_from(form)?;
    let store = state.store(identity)?;
    let attribution = state.stores.attribution(identity);

    store.add(fields, attribution, state.now()?).await
}
