//! Start-up choices: which persistence backend to use and how the live collection is shared.

use std::{fmt::Display, path::PathBuf};

use clap::ValueEnum;

/// The persistence backend picked on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// A JSON snapshot file, for one person on one machine. No log-in.
    Local,
    /// A SQLite collection shared by signed-in users, with live updates.
    Live,
}

/// Who sees which transactions in the live collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SharingMode {
    /// Everyone who signs in sees and edits the same transactions.
    #[default]
    Family,
    /// Each user only sees the transactions they created.
    Personal,
}

impl Display for SharingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SharingMode::Family => f.write_str("family"),
            SharingMode::Personal => f.write_str("personal"),
        }
    }
}

/// Where transactions are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    /// Keep transactions in a JSON file at `path`.
    Local {
        /// The snapshot file. Created on the first save if missing.
        path: PathBuf,
    },
    /// Keep transactions and users in the SQLite database at `db_path`.
    Live {
        /// The database file, or ":memory:" for a throwaway database.
        db_path: PathBuf,
        /// Whether users share one collection.
        sharing: SharingMode,
    },
}

impl StorageConfig {
    /// Build the storage config for `backend` from the command line paths.
    pub fn new(
        backend: BackendKind,
        data_path: PathBuf,
        db_path: PathBuf,
        sharing: SharingMode,
    ) -> Self {
        match backend {
            BackendKind::Local => StorageConfig::Local { path: data_path },
            BackendKind::Live => StorageConfig::Live { db_path, sharing },
        }
    }

    /// Whether users must sign in.
    pub fn requires_auth(&self) -> bool {
        matches!(self, StorageConfig::Live { .. })
    }
}
