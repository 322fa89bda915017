//! The JSON snapshot file used when the tracker runs for a single person on one machine.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use crate::{Error, transaction::Transaction};

/// Reads and writes the full transaction list as a pretty-printed JSON array.
#[derive(Debug, Clone)]
pub struct LocalSnapshotAdapter {
    path: PathBuf,
}

impl LocalSnapshotAdapter {
    /// Create an adapter for the snapshot file at `path`. The file does not have to exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The location of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every transaction from the snapshot file.
    ///
    /// A missing file is an empty collection.
    ///
    /// # Errors
    ///
    /// Returns [Error::StorageError] if the file exists but cannot be read or
    /// does not hold a JSON array of transactions.
    pub fn load(&self) -> Result<Vec<Transaction>, Error> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                tracing::info!(
                    "No snapshot at {}, starting with no transactions",
                    self.path.display()
                );
                return Ok(Vec::new());
            }
            Err(error) => {
                tracing::error!("Could not read {}: {error}", self.path.display());
                return Err(Error::StorageError(error.to_string()));
            }
        };

        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&contents).map_err(|error| {
            tracing::error!("Could not parse {}: {error}", self.path.display());
            Error::StorageError(error.to_string())
        })
    }

    /// Overwrite the snapshot file with `transactions`.
    ///
    /// The list is written to a sibling file first and then renamed over the
    /// snapshot, so a failed write leaves the previous snapshot intact.
    ///
    /// # Errors
    ///
    /// Returns [Error::StorageError] if the file could not be written.
    pub fn save(&self, transactions: &[Transaction]) -> Result<(), Error> {
        let json = serde_json::to_string_pretty(transactions)?;

        let mut temp_path = self.path.clone().into_os_string();
        temp_path.push(".tmp");
        let temp_path = PathBuf::from(temp_path);

        fs::write(&temp_path, json)
            .and_then(|_| fs::rename(&temp_path, &self.path))
            .map_err(|error| {
                tracing::error!("Could not save {}: {error}", self.path.display());
                Error::StorageError(error.to_string())
            })?;

        tracing::debug!(
            "Saved {} transactions to {}",
            transactions.len(),
            self.path.display()
        );

        Ok(())
    }
}
