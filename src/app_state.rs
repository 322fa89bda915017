//! Implements a struct that holds the state of the server.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use rusqlite::Connection;
use sha2::{Digest, Sha512};
use time::Duration;

use crate::{
    Error,
    auth::{DEFAULT_COOKIE_DURATION, create_user_table},
    config::StorageConfig,
    persistence::{LiveCollectionAdapter, LocalSnapshotAdapter},
    transaction::{StoreRegistry, TransactionStore},
};

/// The state of the server, created once at start-up.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,

    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,

    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,

    /// The transaction stores for the configured backend.
    pub stores: Arc<StoreRegistry>,

    /// The database holding registered users. Only set for the live collection.
    pub db_connection: Option<Arc<Mutex<Connection>>>,
}

impl AppState {
    /// Create the state for the backend described by `storage`.
    ///
    /// For the local snapshot this loads the snapshot file. For the live
    /// collection this opens the SQLite database and creates its tables.
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be read or the database cannot be initialized.
    pub fn new(
        storage: &StorageConfig,
        cookie_secret: &str,
        local_timezone: &str,
    ) -> Result<Self, Error> {
        let (stores, db_connection) = match storage {
            StorageConfig::Local { path } => {
                let store = TransactionStore::local(LocalSnapshotAdapter::new(path))?;

                (StoreRegistry::Local(Arc::new(store)), None)
            }
            StorageConfig::Live { db_path, sharing } => {
                let connection = Connection::open(db_path)?;
                create_user_table(&connection)?;
                let connection = Arc::new(Mutex::new(connection));
                let adapter = LiveCollectionAdapter::new(connection.clone())?;

                tracing::info!(
                    "Using live collection at {} shared by {sharing}",
                    db_path.display()
                );

                (StoreRegistry::live(adapter, *sharing), Some(connection))
            }
        };

        Ok(Self {
            cookie_key: create_cookie_key(cookie_secret),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: local_timezone.to_owned(),
            stores: Arc::new(stores),
            db_connection,
        })
    }

    /// Whether users must sign in before using the dashboard.
    pub fn requires_auth(&self) -> bool {
        self.stores.is_live()
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Create a signing key for cookies from a `secret`s string.
pub fn create_cookie_key(secret: &str) -> Key {
    let hash = Sha512::digest(secret);

    Key::from(&hash)
}
