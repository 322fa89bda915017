//! Hands each request the transaction store for the signed-in user's scope.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::extract::FromRef;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    auth::Identity,
    config::SharingMode,
    persistence::{LiveCollectionAdapter, Scope},
    timezone::local_now,
    transaction::{Attribution, TransactionStore},
};

/// The transaction stores for the running server.
///
/// The local snapshot has a single store. The live collection gets one store
/// per scope, created the first time a signed-in user asks for it, so no
/// subscription exists until someone has signed in.
#[derive(Debug)]
pub enum StoreRegistry {
    /// The one store for the snapshot file.
    Local(Arc<TransactionStore>),
    /// Stores over the live collection.
    Live {
        adapter: LiveCollectionAdapter,
        sharing: SharingMode,
        stores: Mutex<HashMap<Scope, Arc<TransactionStore>>>,
    },
}

impl StoreRegistry {
    /// Create a registry for the live collection.
    pub fn live(adapter: LiveCollectionAdapter, sharing: SharingMode) -> Self {
        StoreRegistry::Live {
            adapter,
            sharing,
            stores: Mutex::new(HashMap::new()),
        }
    }

    /// Whether stores are backed by the live collection.
    pub fn is_live(&self) -> bool {
        matches!(self, StoreRegistry::Live { .. })
    }

    /// Get the store for `identity`, subscribing to the live collection if
    /// this is the first request for its scope.
    ///
    /// # Errors
    ///
    /// Returns [Error::Unauthenticated] for the live collection without an
    /// identity, or an error if the subscription could not be created.
    pub fn resolve(&self, identity: Option<&Identity>) -> Result<Arc<TransactionStore>, Error> {
        match self {
            StoreRegistry::Local(store) => Ok(store.clone()),
            StoreRegistry::Live {
                adapter,
                sharing,
                stores,
            } => {
                let identity = identity.ok_or(Error::Unauthenticated)?;
                let scope = match sharing {
                    SharingMode::Family => Scope::Shared,
                    SharingMode::Personal => Scope::Owner(identity.id),
                };

                let mut stores = stores
                    .lock()
                    .inspect_err(|error| tracing::error!("could not lock store registry: {error}"))
                    .map_err(|_| Error::StoreLockError)?;

                if let Some(store) = stores.get(&scope) {
                    return Ok(store.clone());
                }

                let store = Arc::new(TransactionStore::live(adapter.clone(), scope)?);
                stores.insert(scope, store.clone());
                tracing::info!("Opened live transaction store for {scope:?}");

                Ok(store)
            }
        }
    }

    /// Who new transactions should be attributed to.
    pub fn attribution(&self, identity: Option<&Identity>) -> Attribution {
        match (self, identity) {
            (StoreRegistry::Live { .. }, Some(identity)) => Attribution {
                owner_id: Some(identity.id),
                owner_email: Some(identity.email.clone()),
            },
            _ => Attribution::default(),
        }
    }
}

/// The state needed by the transaction pages and endpoints.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// The stores for the configured backend.
    pub stores: Arc<StoreRegistry>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl TransactionState {
    /// The store for `identity`, see [StoreRegistry::resolve].
    pub fn store(&self, identity: Option<&Identity>) -> Result<Arc<TransactionStore>, Error> {
        self.stores.resolve(identity)
    }

    /// The current time in the configured timezone.
    pub fn now(&self) -> Result<OffsetDateTime, Error> {
        local_now(&self.local_timezone)
    }
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            stores: state.stores.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}
