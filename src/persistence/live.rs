//! The live transaction collection: a SQLite table shared by every session,
//! with change notifications pushed to subscribers.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{Connection, Row, params};
use time::{OffsetDateTime, UtcOffset};
use tokio::{sync::watch, task::JoinHandle};

use crate::{
    Error,
    auth::UserID,
    persistence::Scope,
    transaction::{Attribution, Transaction, TransactionFields, TransactionId},
};

/// The full contents of a subscriber's scope at one revision of the collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Increases by one after every write to the collection.
    pub revision: u64,
    /// Newest first.
    pub transactions: Vec<Transaction>,
}

/// Keeps a subscription's listener task running. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    handle: JoinHandle<()>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A transaction collection stored in SQLite.
///
/// Every write bumps the collection revision. Each subscriber has a task that
/// waits for the revision to change, re-reads its scope and hands the new
/// snapshot to its callback.
#[derive(Debug, Clone)]
pub struct LiveCollectionAdapter {
    connection: Arc<Mutex<Connection>>,
    revision: Arc<watch::Sender<u64>>,
}

impl LiveCollectionAdapter {
    /// Create the adapter, creating the transaction table if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the table could not be created or the database lock is poisoned.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Result<Self, Error> {
        {
            let connection = connection
                .lock()
                .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
                .map_err(|_| Error::DatabaseLockError)?;
            create_transaction_table(&connection)?;
        }

        let (sender, _) = watch::channel(0);

        Ok(Self {
            connection,
            revision: Arc::new(sender),
        })
    }

    /// Listen for changes to the transactions in `scope`.
    ///
    /// `on_change` is called straight away with the current snapshot and then
    /// from a background task after every later write. A snapshot that cannot
    /// be read is logged and skipped, so subscribers keep their last good list.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial snapshot could not be read.
    pub fn subscribe<F>(&self, scope: Scope, on_change: F) -> Result<Subscription, Error>
    where
        F: Fn(Snapshot) + Send + Sync + 'static,
    {
        let mut receiver = self.revision.subscribe();
        let revision = *receiver.borrow_and_update();

        on_change(Snapshot {
            revision,
            transactions: self.query(scope)?,
        });

        let adapter = self.clone();
        let handle = tokio::spawn(async move {
            while receiver.changed().await.is_ok() {
                let revision = *receiver.borrow_and_update();

                match adapter.query(scope) {
                    Ok(transactions) => on_change(Snapshot {
                        revision,
                        transactions,
                    }),
                    Err(error) => tracing::error!(
                        "could not read revision {revision} of the live collection for {scope:?}: {error}"
                    ),
                }
            }
        });

        tracing::debug!("Subscribed to the live collection for {scope:?}");

        Ok(Subscription { handle })
    }

    /// Insert a new transaction and notify subscribers.
    ///
    /// Returns the new transaction's ID and the revision that includes it.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn create(
        &self,
        fields: TransactionFields,
        attribution: Attribution,
        now: OffsetDateTime,
    ) -> Result<(TransactionId, u64), Error> {
        let id = {
            let connection = self.lock()?;
            connection.execute(
                "INSERT INTO \"transaction\"
                    (type, description, amount, category, date, created_at, owner_id, owner_email)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    fields.type_,
                    fields.description,
                    fields.amount,
                    fields.category,
                    fields.date,
                    now.to_offset(UtcOffset::UTC),
                    attribution.owner_id.map(|id| id.as_i64()),
                    attribution.owner_email,
                ],
            )?;

            TransactionId::new(connection.last_insert_rowid())
        };

        Ok((id, self.publish()))
    }

    /// Replace the user editable fields of transaction `id` and notify subscribers.
    ///
    /// # Errors
    ///
    /// Returns [Error::UpdateMissingTransaction] if `id` is not in `scope`.
    pub fn update(
        &self,
        scope: Scope,
        id: TransactionId,
        fields: TransactionFields,
        now: OffsetDateTime,
    ) -> Result<u64, Error> {
        let rows_changed = {
            let connection = self.lock()?;
            connection.execute(
                "UPDATE \"transaction\"
                 SET type = ?1, description = ?2, amount = ?3, category = ?4, date = ?5, updated_at = ?6
                 WHERE id = ?7 AND (?8 IS NULL OR owner_id = ?8)",
                params![
                    fields.type_,
                    fields.description,
                    fields.amount,
                    fields.category,
                    fields.date,
                    now.to_offset(UtcOffset::UTC),
                    id,
                    scope.owner().map(|id| id.as_i64()),
                ],
            )?
        };

        if rows_changed == 0 {
            return Err(Error::UpdateMissingTransaction);
        }

        Ok(self.publish())
    }

    /// Delete transaction `id` and notify subscribers.
    ///
    /// Returns whether a transaction was deleted, and the new revision.
    /// Deleting an ID that is not in `scope` changes nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn remove(&self, scope: Scope, id: TransactionId) -> Result<(bool, u64), Error> {
        let rows_changed = {
            let connection = self.lock()?;
            connection.execute(
                "DELETE FROM \"transaction\" WHERE id = ?1 AND (?2 IS NULL OR owner_id = ?2)",
                params![id, scope.owner().map(|id| id.as_i64())],
            )?
        };

        Ok((rows_changed > 0, self.publish()))
    }

    /// Delete every transaction in `scope` and notify subscribers.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn clear(&self, scope: Scope) -> Result<u64, Error> {
        let rows_changed = {
            let connection = self.lock()?;
            connection.execute(
                "DELETE FROM \"transaction\" WHERE ?1 IS NULL OR owner_id = ?1",
                [scope.owner().map(|id| id.as_i64())],
            )?
        };

        tracing::info!("Cleared {rows_changed} transactions from {scope:?}");

        Ok(self.publish())
    }

    /// Replace every transaction in `scope` with `transactions`, keeping their IDs.
    ///
    /// Nothing is changed if any transaction cannot be inserted.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidImportFile] if an ID is repeated or already used
    /// outside of `scope`.
    pub fn import(&self, scope: Scope, transactions: &[Transaction]) -> Result<u64, Error> {
        {
            let mut connection = self.lock()?;
            let sql_transaction = connection.transaction()?;

            sql_transaction.execute(
                "DELETE FROM \"transaction\" WHERE ?1 IS NULL OR owner_id = ?1",
                [scope.owner().map(|id| id.as_i64())],
            )?;

            {
                let mut statement = sql_transaction.prepare(
                    "INSERT INTO \"transaction\"
                        (id, type, description, amount, category, date, created_at, updated_at, owner_id, owner_email)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                )?;

                for transaction in transactions {
                    statement
                        .execute(params![
                            transaction.id,
                            transaction.type_,
                            transaction.description,
                            transaction.amount,
                            transaction.category,
                            transaction.date,
                            transaction.created_at.to_offset(UtcOffset::UTC),
                            transaction
                                .updated_at
                                .map(|updated_at| updated_at.to_offset(UtcOffset::UTC)),
                            transaction.owner_id.map(|id| id.as_i64()),
                            transaction.owner_email,
                        ])
                        .map_err(|error| match error {
                            rusqlite::Error::SqliteFailure(
                                rusqlite::ffi::Error {
                                    code: _,
                                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY,
                                },
                                _,
                            ) => Error::InvalidImportFile(format!(
                                "transaction {} appears more than once or belongs to someone else",
                                transaction.id
                            )),
                            error => error.into(),
                        })?;
                }
            }

            sql_transaction.commit()?;
        }

        tracing::info!("Imported {} transactions into {scope:?}", transactions.len());

        Ok(self.publish())
    }

    fn query(&self, scope: Scope) -> Result<Vec<Transaction>, Error> {
        let connection = self.lock()?;

        let transactions = connection
            .prepare(
                "SELECT id, type, description, amount, category, date, created_at, updated_at, owner_id, owner_email
                 FROM \"transaction\"
                 WHERE ?1 IS NULL OR owner_id = ?1
                 ORDER BY created_at DESC, id DESC",
            )?
            .query_map([scope.owner().map(|id| id.as_i64())], map_transaction_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    fn publish(&self) -> u64 {
        let mut revision = 0;
        self.revision.send_modify(|current| {
            *current += 1;
            revision = *current;
        });

        revision
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)
    }
}

/// Create the live transaction table.
///
/// # Errors
///
/// Returns an error if the table cannot be created.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                type TEXT NOT NULL,
                description TEXT NOT NULL,
                amount REAL NOT NULL CHECK (amount >= 0),
                category TEXT NOT NULL,
                date TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT,
                owner_id INTEGER,
                owner_email TEXT
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_owner_created
            ON \"transaction\"(owner_id, created_at);",
        (),
    )?;

    Ok(())
}

fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let owner_id: Option<i64> = row.get(8)?;

    Ok(Transaction {
        id: row.get(0)?,
        type_: row.get(1)?,
        description: row.get(2)?,
        amount: row.get(3)?,
        category: row.get(4)?,
        date: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
        owner_id: owner_id.map(UserID::new),
        owner_email: row.get(9)?,
    })
}
