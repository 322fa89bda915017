//! Where transactions are kept between requests.
//!
//! - [LocalSnapshotAdapter]: the whole collection as one JSON file, read on
//!   start-up and rewritten after every change.
//! - [LiveCollectionAdapter]: a SQLite collection shared by every session of
//!   the server, which pushes a fresh snapshot to each subscriber whenever it
//!   changes.

mod live;
mod local;

pub use live::{LiveCollectionAdapter, Snapshot, Subscription, create_transaction_table};
pub use local::LocalSnapshotAdapter;

use crate::auth::UserID;

/// The part of the live collection a subscriber sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Every transaction, whoever created it. Used by households sharing one budget.
    Shared,
    /// Only the transactions created by one user.
    Owner(UserID),
}

impl Scope {
    pub(crate) fn owner(&self) -> Option<UserID> {
        match self {
            Scope::Shared => None,
            Scope::Owner(user_id) => Some(*user_id),
        }
    }
}
