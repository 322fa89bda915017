//! Pushes a refresh signal to open dashboards whenever the transactions they
//! show change, including changes made by other signed-in users.

use std::convert::Infallible;

use axum::{
    Extension,
    extract::State,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use tokio_stream::{StreamExt, wrappers::WatchStream};

use crate::{auth::Identity, transaction::TransactionState};

/// The name of the event the dashboard listens for.
pub(super) const REFRESH_EVENT: &str = "refresh";

/// Stream a `refresh` event each time the store for the user's scope changes.
///
/// The stream stays open until the browser goes away.
pub async fn get_dashboard_events(
    State(state): State<TransactionState>,
    identity: Option<Extension<Identity>>,
) -> Response {
    let store = match state.store(identity.as_deref()) {
        Ok(store) => store,
        Err(error) => {
            tracing::error!("Could not open the dashboard event stream: {error}");
            return error.into_response();
        }
    };

    let events = WatchStream::from_changes(store.subscribe()).map(|change| {
        tracing::debug!("Sending dashboard refresh {change}");
        Ok::<_, Infallible>(Event::default().event(REFRESH_EVENT).data(change.to_string()))
    });

    Sse::new(events)
        .keep_alive(KeepAlive::default())
        .into_response()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::{Extension, extract::State};
    use tempfile::tempdir;
    use time::macros::{date, datetime};
    use tokio_stream::StreamExt;

    use crate::{
        auth::{Identity, UserID},
        test_utils::assert_content_type,
        transaction::{
            Attribution, Category, TransactionFields, TransactionType, test_utils::local_state,
        },
    };

    use super::get_dashboard_events;

    #[tokio::test]
    async fn sends_refresh_after_a_change() {
        let dir = tempdir().unwrap();
        let state = local_state(dir.path(), &[]);

        let response = get_dashboard_events(State(state.clone()), None).await;
        assert_content_type(&response, "text/event-stream");
        let mut body = response.into_body().into_data_stream();

        let fields = TransactionFields::new(
            TransactionType::Expense,
            "Coffee",
            4.5,
            Category::Food,
            date!(2024 - 01 - 15),
        )
        .unwrap();
        state
            .store(None)
            .unwrap()
            .add(fields, Attribution::default(), datetime!(2024-01-15 09:00 UTC))
            .await
            .unwrap();

        let frame = tokio::time::timeout(Duration::from_secs(2), body.next())
            .await
            .expect("no event within two seconds")
            .expect("stream ended")
            .unwrap();
        let frame = String::from_utf8(frame.to_vec()).unwrap();
        assert!(frame.contains("event: refresh"), "unexpected frame {frame:?}");
    }

    #[tokio::test]
    async fn nothing_is_sent_until_something_changes() {
        let dir = tempdir().unwrap();
        let state = local_state(dir.path(), &[]);

        let response = get_dashboard_events(
            State(state),
            Some(Extension(Identity {
                id: UserID::new(1),
                email: "sam@example.com".to_owned(),
            })),
        )
        .await;
        let mut body = response.into_body().into_data_stream();

        let frame = tokio::time::timeout(Duration::from_millis(100), body.next()).await;

        assert!(frame.is_err(), "got an event without a change: {frame:?}");
    }
}
