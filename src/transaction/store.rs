//! The in-memory transaction list and the backend that keeps it.

use std::{
    collections::HashSet,
    sync::{Arc, RwLock},
    time::Duration,
};

use time::OffsetDateTime;
use tokio::sync::watch;

use crate::{
    Error,
    persistence::{LiveCollectionAdapter, LocalSnapshotAdapter, Scope, Snapshot, Subscription},
    transaction::{Attribution, Transaction, TransactionFields, TransactionId, next_local_id},
};

/// How long a live write waits for its snapshot before the response is sent anyway.
const SNAPSHOT_WAIT: Duration = Duration::from_secs(2);

#[derive(Debug)]
struct StoreState {
    transactions: RwLock<Vec<Transaction>>,
    last_updated: RwLock<Option<OffsetDateTime>>,
    /// Counts the changes applied since start-up.
    changes: watch::Sender<u64>,
}

impl Default for StoreState {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl StoreState {
    fn new(transactions: Vec<Transaction>) -> Self {
        let (changes, _) = watch::channel(0);

        Self {
            transactions: RwLock::new(transactions),
            last_updated: RwLock::new(None),
            changes,
        }
    }

    fn read(&self) -> Result<Vec<Transaction>, Error> {
        self.transactions
            .read()
            .map(|transactions| transactions.clone())
            .inspect_err(|error| tracing::error!("could not read transaction list: {error}"))
            .map_err(|_| Error::StoreLockError)
    }

    /// Swap in `transactions`, returning whether the list changed.
    fn replace(&self, transactions: Vec<Transaction>) -> Result<bool, Error> {
        let mut current = self
            .transactions
            .write()
            .inspect_err(|error| tracing::error!("could not write transaction list: {error}"))
            .map_err(|_| Error::StoreLockError)?;

        if *current == transactions {
            return Ok(false);
        }

        *current = transactions;

        Ok(true)
    }

    fn touch(&self) {
        match self.last_updated.write() {
            Ok(mut last_updated) => *last_updated = Some(OffsetDateTime::now_utc()),
            Err(error) => tracing::error!("could not set last updated time: {error}"),
        }

        self.changes.send_modify(|count| *count += 1);
    }
}

#[derive(Debug)]
enum Backend {
    Local(LocalSnapshotAdapter),
    Live {
        adapter: LiveCollectionAdapter,
        scope: Scope,
        applied: watch::Receiver<u64>,
        _subscription: Subscription,
    },
}

/// Owns the transaction list shown to one scope of users and routes every
/// change through its persistence backend.
///
/// With the local snapshot each change is applied to the list and then the
/// whole list is saved. With the live collection each change is sent to the
/// collection and the list is replaced by the snapshot that comes back.
#[derive(Debug)]
pub struct TransactionStore {
    state: Arc<StoreState>,
    backend: Backend,
}

impl TransactionStore {
    /// Create a store backed by the snapshot file, loading its transactions.
    ///
    /// # Errors
    ///
    /// Returns [Error::StorageError] if the snapshot exists but cannot be read.
    pub fn local(adapter: LocalSnapshotAdapter) -> Result<Self, Error> {
        let transactions = adapter.load()?;
        tracing::info!(
            "Loaded {} transactions from {}",
            transactions.len(),
            adapter.path().display()
        );

        Ok(Self {
            state: Arc::new(StoreState::new(transactions)),
            backend: Backend::Local(adapter),
        })
    }

    /// Create a store that mirrors `scope` of the live collection.
    ///
    /// Must be called from within a tokio runtime. The subscription ends when
    /// the store is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial snapshot could not be read.
    pub fn live(adapter: LiveCollectionAdapter, scope: Scope) -> Result<Self, Error> {
        let state = Arc::new(StoreState::default());
        let (applied_sender, applied) = watch::channel(0);
        let first_revision = Arc::new(RwLock::new(None));

        let subscription = {
            let state = state.clone();

            adapter.subscribe(scope, move |snapshot: Snapshot| {
                let is_initial = match first_revision.write() {
                    Ok(mut first) => *first.get_or_insert(snapshot.revision) == snapshot.revision,
                    Err(_) => false,
                };

                match state.replace(snapshot.transactions) {
                    Ok(true) if !is_initial => state.touch(),
                    Ok(_) => {}
                    Err(error) => tracing::error!(
                        "could not apply revision {} for {scope:?}: {error}",
                        snapshot.revision
                    ),
                }

                applied_sender.send_replace(snapshot.revision);
            })?
        };

        Ok(Self {
            state,
            backend: Backend::Live {
                adapter,
                scope,
                applied,
                _subscription: subscription,
            },
        })
    }

    /// Every transaction, newest first.
    ///
    /// # Errors
    ///
    /// Returns [Error::StoreLockError] if the list lock is poisoned.
    pub fn transactions(&self) -> Result<Vec<Transaction>, Error> {
        self.state.read()
    }

    /// The transaction with `id`.
    ///
    /// # Errors
    ///
    /// Returns [Error::NotFound] if there is no such transaction.
    pub fn get(&self, id: TransactionId) -> Result<Transaction, Error> {
        self.state
            .read()?
            .into_iter()
            .find(|transaction| transaction.id == id)
            .ok_or(Error::NotFound)
    }

    /// When this store last saved a change, if it has since start-up.
    pub fn last_updated(&self) -> Option<OffsetDateTime> {
        self.state
            .last_updated
            .read()
            .map(|last_updated| *last_updated)
            .unwrap_or(None)
    }

    /// Watch for changes to the list, whether made through this store or, for
    /// the live collection, by another session.
    ///
    /// The value counts changes since start-up and is only useful for noticing
    /// that it moved.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.state.changes.subscribe()
    }

    /// Record a new transaction at the top of the list.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction could not be saved, in which case
    /// the list is unchanged.
    pub async fn add(
        &self,
        fields: TransactionFields,
        attribution: Attribution,
        now: OffsetDateTime,
    ) -> Result<TransactionId, Error> {
        match &self.backend {
            Backend::Local(adapter) => {
                let id = self.mutate_local(adapter, |transactions| {
                    let id = next_local_id(transactions, now);
                    transactions.insert(0, Transaction::from_fields(id, fields, attribution, now));
                    Ok(id)
                })?;
                tracing::info!("Created transaction {id}");

                Ok(id)
            }
            Backend::Live { adapter, .. } => {
                let (id, revision) = adapter.create(fields, attribution, now)?;
                tracing::info!("Created transaction {id}");
                self.wait_for_revision(revision).await;

                Ok(id)
            }
        }
    }

    /// Replace the editable fields of transaction `id`.
    ///
    /// # Errors
    ///
    /// Returns [Error::UpdateMissingTransaction] if there is no such transaction.
    pub async fn update(
        &self,
        id: TransactionId,
        fields: TransactionFields,
        now: OffsetDateTime,
    ) -> Result<(), Error> {
        match &self.backend {
            Backend::Local(adapter) => self.mutate_local(adapter, |transactions| {
                transactions
                    .iter_mut()
                    .find(|transaction| transaction.id == id)
                    .ok_or(Error::UpdateMissingTransaction)?
                    .apply_edit(fields, now);
                Ok(())
            }),
            Backend::Live { adapter, scope, .. } => {
                let revision = adapter.update(*scope, id, fields, now)?;
                self.wait_for_revision(revision).await;

                Ok(())
            }
        }?;

        tracing::info!("Updated transaction {id}");

        Ok(())
    }

    /// Delete transaction `id`, returning whether it existed.
    ///
    /// Deleting a missing transaction changes nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the change could not be saved.
    pub async fn delete(&self, id: TransactionId) -> Result<bool, Error> {
        let deleted = match &self.backend {
            Backend::Local(adapter) => {
                let exists = self
                    .state
                    .read()?
                    .iter()
                    .any(|transaction| transaction.id == id);

                if exists {
                    self.mutate_local(adapter, |transactions| {
                        transactions.retain(|transaction| transaction.id != id);
                        Ok(())
                    })?;
                }

                exists
            }
            Backend::Live { adapter, scope, .. } => {
                let (deleted, revision) = adapter.remove(*scope, id)?;
                self.wait_for_revision(revision).await;
                deleted
            }
        };

        if deleted {
            tracing::info!("Deleted transaction {id}");
        } else {
            tracing::debug!("Tried to delete missing transaction {id}");
        }

        Ok(deleted)
    }

    /// Replace the whole collection with `transactions`.
    ///
    /// # Errors
    ///
    /// Returns an error if the new collection could not be saved.
    pub async fn replace(&self, transactions: Vec<Transaction>) -> Result<(), Error> {
        match &self.backend {
            Backend::Local(adapter) => self.mutate_local(adapter, |current| {
                *current = transactions;
                Ok(())
            }),
            Backend::Live { adapter, scope, .. } => {
                let revision = adapter.import(*scope, &transactions)?;
                self.wait_for_revision(revision).await;

                Ok(())
            }
        }
    }

    /// Replace the collection with transactions read from an export file.
    ///
    /// When the store only shows one user's transactions, the imported
    /// transactions are attributed to that user.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidImportFile] if an amount is invalid or an ID is
    /// repeated.
    pub async fn import(
        &self,
        mut transactions: Vec<Transaction>,
        attribution: Attribution,
    ) -> Result<usize, Error> {
        let mut seen = HashSet::new();

        for transaction in &mut transactions {
            if !transaction.amount.is_finite() || transaction.amount < 0.0 {
                return Err(Error::InvalidImportFile(format!(
                    "transaction {} has an invalid amount {}",
                    transaction.id, transaction.amount
                )));
            }

            if !seen.insert(transaction.id) {
                return Err(Error::InvalidImportFile(format!(
                    "transaction {} appears more than once",
                    transaction.id
                )));
            }

            if let Backend::Live {
                scope: Scope::Owner(_),
                ..
            } = &self.backend
            {
                transaction.owner_id = attribution.owner_id;
                transaction.owner_email = attribution.owner_email.clone();
            }
        }

        let count = transactions.len();
        self.replace(transactions).await?;
        tracing::info!("Imported {count} transactions");

        Ok(count)
    }

    /// Delete every transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the change could not be saved.
    pub async fn clear(&self) -> Result<(), Error> {
        match &self.backend {
            Backend::Local(adapter) => self.mutate_local(adapter, |transactions| {
                transactions.clear();
                Ok(())
            }),
            Backend::Live { adapter, scope, .. } => {
                let revision = adapter.clear(*scope)?;
                self.wait_for_revision(revision).await;

                Ok(())
            }
        }?;

        tracing::info!("Cleared all transactions");

        Ok(())
    }

    /// Apply `change` to a copy of the list, save the copy and then make it the
    /// current list. The list is left as it was if `change` or the save fails.
    fn mutate_local<T>(
        &self,
        adapter: &LocalSnapshotAdapter,
        change: impl FnOnce(&mut Vec<Transaction>) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let mut transactions = self
            .state
            .transactions
            .write()
            .inspect_err(|error| tracing::error!("could not write transaction list: {error}"))
            .map_err(|_| Error::StoreLockError)?;

        let mut updated = transactions.clone();
        let result = change(&mut updated)?;
        adapter.save(&updated)?;
        *transactions = updated;
        drop(transactions);

        self.state.touch();

        Ok(result)
    }

    /// Wait until the live snapshot that includes `revision` has been applied.
    async fn wait_for_revision(&self, revision: u64) {
        let Backend::Live { applied, .. } = &self.backend else {
            return;
        };

        let mut applied = applied.clone();
        let result = tokio::time::timeout(
            SNAPSHOT_WAIT,
            applied.wait_for(|applied| *applied >= revision),
        )
        .await
        .map(|result| result.is_ok());

        match result {
            Ok(true) => {}
            Ok(false) => tracing::warn!("subscription ended before revision {revision} arrived"),
            Err(_) => tracing::warn!("timed out waiting for revision {revision}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;
    use tempfile::{TempDir, tempdir};
    use time::macros::{date, datetime};

    use crate::{
        Error,
        auth::UserID,
        persistence::{LiveCollectionAdapter, LocalSnapshotAdapter, Scope},
        transaction::{
            Attribution, Category, TransactionFields, TransactionId, TransactionType,
            core::test_transaction,
        },
    };

    use super::TransactionStore;

    fn local_store() -> (TransactionStore, LocalSnapshotAdapter, TempDir) {
        let dir = tempdir().unwrap();
        let adapter = LocalSnapshotAdapter::new(dir.path().join("transactions.json"));
        let store = TransactionStore::local(adapter.clone()).unwrap();

        (store, adapter, dir)
    }

    fn live_adapter() -> LiveCollectionAdapter {
        let connection = Connection::open_in_memory().unwrap();
        LiveCollectionAdapter::new(Arc::new(Mutex::new(connection))).unwrap()
    }

    fn fields(description: &str, amount: f64) -> TransactionFields {
        TransactionFields::new(
            TransactionType::Expense,
            description,
            amount,
            Category::Food,
            date!(2024 - 01 - 15),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn local_add_prepends_and_saves() {
        let (store, adapter, _dir) = local_store();
        let now = datetime!(2024-01-15 12:00 UTC);

        let first = store
            .add(fields("Lunch", 12.0), Attribution::default(), now)
            .await
            .unwrap();
        let second = store
            .add(fields("Dinner", 30.0), Attribution::default(), now)
            .await
            .unwrap();

        let transactions = store.transactions().unwrap();
        assert_eq!(transactions[0].id, second);
        assert_eq!(transactions[1].id, first);
        assert_ne!(first, second);
        assert_eq!(adapter.load().unwrap(), transactions);
        assert!(store.last_updated().is_some());
    }

    #[tokio::test]
    async fn local_store_loads_existing_snapshot() {
        let dir = tempdir().unwrap();
        let adapter = LocalSnapshotAdapter::new(dir.path().join("transactions.json"));
        let saved = vec![test_transaction(
            1,
            TransactionType::Income,
            100.0,
            Category::Work,
            date!(2024 - 01 - 10),
        )];
        adapter.save(&saved).unwrap();

        let store = TransactionStore::local(adapter).unwrap();

        assert_eq!(store.transactions().unwrap(), saved);
        assert_eq!(store.last_updated(), None);
    }

    #[tokio::test]
    async fn local_update_preserves_id_and_created_at() {
        let (store, adapter, _dir) = local_store();
        let created_at = datetime!(2024-01-15 12:00 UTC);
        let edited_at = datetime!(2024-01-16 12:00 UTC);
        let id = store
            .add(fields("Lunch", 12.0), Attribution::default(), created_at)
            .await
            .unwrap();

        store
            .update(id, fields("Brunch", 15.0), edited_at)
            .await
            .unwrap();

        let transaction = store.get(id).unwrap();
        assert_eq!(transaction.description, "Brunch");
        assert_eq!(transaction.amount, 15.0);
        assert_eq!(transaction.created_at, created_at);
        assert_eq!(transaction.updated_at, Some(edited_at));
        assert_eq!(adapter.load().unwrap(), vec![transaction]);
    }

    #[tokio::test]
    async fn local_update_of_missing_id_fails() {
        let (store, _adapter, _dir) = local_store();

        let result = store
            .update(
                TransactionId::new(42),
                fields("Brunch", 15.0),
                datetime!(2024-01-16 12:00 UTC),
            )
            .await;

        assert_eq!(result, Err(Error::UpdateMissingTransaction));
    }

    #[tokio::test]
    async fn local_delete_of_missing_id_is_a_no_op() {
        let (store, _adapter, _dir) = local_store();
        store
            .add(
                fields("Lunch", 12.0),
                Attribution::default(),
                datetime!(2024-01-15 12:00 UTC),
            )
            .await
            .unwrap();
        let before = store.transactions().unwrap();

        let deleted = store.delete(TransactionId::new(42)).await.unwrap();

        assert!(!deleted);
        assert_eq!(store.transactions().unwrap(), before);
    }

    #[tokio::test]
    async fn local_delete_removes_and_saves() {
        let (store, adapter, _dir) = local_store();
        let id = store
            .add(
                fields("Lunch", 12.0),
                Attribution::default(),
                datetime!(2024-01-15 12:00 UTC),
            )
            .await
            .unwrap();

        let deleted = store.delete(id).await.unwrap();

        assert!(deleted);
        assert!(store.transactions().unwrap().is_empty());
        assert!(adapter.load().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_save_leaves_list_unchanged() {
        let dir = tempdir().unwrap();
        // A directory where the file should be makes the rename fail.
        let path = dir.path().join("transactions.json");
        std::fs::create_dir(&path).unwrap();
        let adapter = LocalSnapshotAdapter::new(&path);
        let store = TransactionStore {
            state: Default::default(),
            backend: super::Backend::Local(adapter),
        };

        let result = store
            .add(
                fields("Lunch", 12.0),
                Attribution::default(),
                datetime!(2024-01-15 12:00 UTC),
            )
            .await;

        assert!(matches!(result, Err(Error::StorageError(_))));
        assert!(store.transactions().unwrap().is_empty());
    }

    #[tokio::test]
    async fn import_rejects_repeated_ids() {
        let (store, _adapter, _dir) = local_store();
        let transaction = test_transaction(
            1,
            TransactionType::Income,
            100.0,
            Category::Work,
            date!(2024 - 01 - 10),
        );

        let result = store
            .import(
                vec![transaction.clone(), transaction],
                Attribution::default(),
            )
            .await;

        assert!(matches!(result, Err(Error::InvalidImportFile(_))));
    }

    #[tokio::test]
    async fn import_rejects_negative_amounts() {
        let (store, _adapter, _dir) = local_store();
        let transaction = test_transaction(
            1,
            TransactionType::Income,
            -100.0,
            Category::Work,
            date!(2024 - 01 - 10),
        );

        let result = store.import(vec![transaction], Attribution::default()).await;

        assert!(matches!(result, Err(Error::InvalidImportFile(_))));
    }

    #[tokio::test]
    async fn export_then_import_round_trips() {
        let (store, _adapter, _dir) = local_store();
        store
            .add(
                fields("Lunch", 12.0),
                Attribution::default(),
                datetime!(2024-01-15 12:00 UTC),
            )
            .await
            .unwrap();
        store
            .add(
                fields("Dinner", 30.0),
                Attribution::default(),
                datetime!(2024-01-15 19:00 UTC),
            )
            .await
            .unwrap();
        let exported = serde_json::to_string_pretty(&store.transactions().unwrap()).unwrap();
        store.clear().await.unwrap();

        store
            .import(
                serde_json::from_str(&exported).unwrap(),
                Attribution::default(),
            )
            .await
            .unwrap();

        assert_eq!(
            serde_json::to_string_pretty(&store.transactions().unwrap()).unwrap(),
            exported
        );
    }

    #[tokio::test]
    async fn live_add_is_visible_once_snapshot_arrives() {
        let store = TransactionStore::live(live_adapter(), Scope::Shared).unwrap();
        assert!(store.transactions().unwrap().is_empty());
        assert_eq!(store.last_updated(), None);

        let id = store
            .add(
                fields("Lunch", 12.0),
                Attribution::default(),
                datetime!(2024-01-15 12:00 UTC),
            )
            .await
            .unwrap();

        let transactions = store.transactions().unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].id, id);
        assert!(store.last_updated().is_some());
    }

    #[tokio::test]
    async fn live_stores_share_family_changes() {
        let adapter = live_adapter();
        let alice = TransactionStore::live(adapter.clone(), Scope::Shared).unwrap();
        let bob = TransactionStore::live(adapter, Scope::Shared).unwrap();

        alice
            .add(
                fields("Groceries", 80.0),
                Attribution {
                    owner_id: Some(UserID::new(1)),
                    owner_email: Some("alice@example.com".to_owned()),
                },
                datetime!(2024-01-15 12:00 UTC),
            )
            .await
            .unwrap();
        let deleted = bob
            .delete(alice.transactions().unwrap()[0].id)
            .await
            .unwrap();

        assert!(deleted);
        assert!(bob.transactions().unwrap().is_empty());
    }

    #[tokio::test]
    async fn personal_import_is_attributed_to_the_importer() {
        let user = UserID::new(7);
        let store = TransactionStore::live(live_adapter(), Scope::Owner(user)).unwrap();
        let mut transaction = test_transaction(
            1,
            TransactionType::Income,
            100.0,
            Category::Work,
            date!(2024 - 01 - 10),
        );
        transaction.owner_id = Some(UserID::new(99));

        store
            .import(
                vec![transaction],
                Attribution {
                    owner_id: Some(user),
                    owner_email: Some("me@example.com".to_owned()),
                },
            )
            .await
            .unwrap();

        let transactions = store.transactions().unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].owner_id, Some(user));
        assert_eq!(
            transactions[0].owner_email.as_deref(),
            Some("me@example.com")
        );
    }

    #[tokio::test]
    async fn local_changes_are_announced() {
        let (store, _adapter, _dir) = local_store();
        let mut changes = store.subscribe();

        store
            .add(
                fields("Lunch", 12.0),
                Attribution::default(),
                datetime!(2024-01-15 12:00 UTC),
            )
            .await
            .unwrap();

        assert!(changes.has_changed().unwrap());
        changes.borrow_and_update();

        store.delete(TransactionId::new(42)).await.unwrap();

        assert!(!changes.has_changed().unwrap());
    }

    #[tokio::test]
    async fn another_sessions_write_is_announced() {
        let adapter = live_adapter();
        let alice = TransactionStore::live(adapter.clone(), Scope::Shared).unwrap();
        let bob = TransactionStore::live(adapter, Scope::Shared).unwrap();
        let mut bob_changes = bob.subscribe();

        alice
            .add(
                fields("Groceries", 80.0),
                Attribution::default(),
                datetime!(2024-01-15 12:00 UTC),
            )
            .await
            .unwrap();

        tokio::time::timeout(std::time::Duration::from_secs(2), bob_changes.changed())
            .await
            .expect("bob was not told about alice's write")
            .unwrap();
        assert_eq!(bob.transactions().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn writes_to_another_scope_are_not_announced() {
        let adapter = live_adapter();
        let alice =
            TransactionStore::live(adapter.clone(), Scope::Owner(UserID::new(1))).unwrap();
        let bob = TransactionStore::live(adapter, Scope::Owner(UserID::new(2))).unwrap();
        let bob_changes = bob.subscribe();

        alice
            .add(
                fields("Groceries", 80.0),
                Attribution {
                    owner_id: Some(UserID::new(1)),
                    owner_email: Some("alice@example.com".to_owned()),
                },
                datetime!(2024-01-15 12:00 UTC),
            )
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        assert!(!bob_changes.has_changed().unwrap());
        assert_eq!(bob.last_updated(), None);
    }
}
