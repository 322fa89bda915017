//! Download the transaction list as a JSON file, and replace it with an uploaded one.

use axum::{
    Extension,
    extract::{Multipart, State, multipart::Field},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;

use crate::{
    Error,
    auth::Identity,
    endpoints,
    transaction::{Transaction, TransactionState},
};

/// The multipart field that holds the uploaded export file.
const IMPORT_FIELD_NAME: &str = "file";

/// A route handler that sends every visible transaction as a JSON attachment.
///
/// The file name carries the local date, e.g. `transactions_2025-01-31.json`.
pub async fn export_transactions(
    State(state): State<TransactionState>,
    identity: Option<Extension<Identity>>,
) -> Response {
    match export_json(&state, identity.as_deref()) {
        Ok((file_name, json)) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/json".to_owned()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{file_name}\""),
                ),
            ],
            json,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not export transactions: {error}");
            error.into_response()
        }
    }
}

fn export_json(
    state: &TransactionState,
    identity: Option<&Identity>,
) -> Result<(String, String), Error> {
    let transactions = state.store(identity)?.transactions()?;
    let json = serde_json::to_string_pretty(&transactions)?;
    let file_name = format!("transactions_{}.json", state.now()?.date());

    Ok((file_name, json))
}

/// A route handler that replaces the transaction list with an uploaded export file.
///
/// The upload must be a JSON array of transactions. Nothing changes if any of
/// it is invalid.
pub async fn import_transactions(
    State(state): State<TransactionState>,
    identity: Option<Extension<Identity>>,
    multipart: Multipart,
) -> Response {
    match import(&state, identity.as_deref(), multipart).await {
        Ok(count) => {
            tracing::debug!("Import replaced the collection with {count} transactions");
            (
                HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("Could not import transactions: {error}");
            error.into_alert_response()
        }
    }
}

async fn import(
    state: &TransactionState,
    identity: Option<&Identity>,
    mut multipart: Multipart,
) -> Result<usize, Error> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| Error::MultipartError(error.body_text()))?
    {
        if field.name() == Some(IMPORT_FIELD_NAME) {
            upload = Some(read_field(field).await?);
        }
    }

    let Some(bytes) = upload else {
        return Err(Error::MultipartError("No file was uploaded.".to_owned()));
    };

    let transactions = serde_json::from_slice::<Vec<Transaction>>(&bytes)
        .map_err(|error| Error::InvalidImportFile(error.to_string()))?;

    let store = state.store(identity)?;
    store
        .import(transactions, state.stores.attribution(identity))
        .await
}

async fn read_field(field: Field<'_>) -> Result<Vec<u8>, Error> {
    let file_name = field.file_name().unwrap_or("<unnamed>").to_owned();

    let bytes = field.bytes().await.map_err(|error| {
        tracing::error!("Could not read uploaded file {file_name}: {error}");
        Error::MultipartError(format!("Could not read the file {file_name}."))
    })?;

    tracing::debug!("Read {} bytes from {file_name}", bytes.len());

    Ok(bytes.to_vec())
}
