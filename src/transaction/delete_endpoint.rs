use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::{HxCurrentUrl, HxRedirect};

use crate::{
    auth::Identity,
    endpoints,
    transaction::{FilterCriteria, TransactionId, TransactionState},
};

/// A route handler for deleting a transaction.
///
/// Redirects back to the dashboard with the same filters so the summary cards
/// and charts are redrawn along with the list. Deleting a transaction that is
/// already gone is not an error.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionState>,
    identity: Option<Extension<Identity>>,
    Path(transaction_id): Path<TransactionId>,
    current_url: HxCurrentUrl,
) -> Response {
    let store = match state.store(identity.as_deref()) {
        Ok(store) => store,
        Err(error) => return error.into_alert_response(),
    };

    match store.delete(transaction_id).await {
        Ok(_) => (
            HxRedirect(FilterCriteria::from_current_url(&current_url).dashboard_url()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not delete transaction {transaction_id}: {error}");
            error.into_alert_response()
        }
    }
}

/// A route handler for deleting every transaction, redirects to the dashboard.
pub async fn clear_transactions_endpoint(
    State(state): State<TransactionState>,
    identity: Option<Extension<Identity>>,
) -> Response {
    let result = match state.store(identity.as_deref()) {
        Ok(store) => store.clear().await,
        Err(error) => Err(error),
    };

    match result {
        Ok(()) => (
            HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not clear transactions: {error}");
            error.into_alert_response()
        }
    }
}
