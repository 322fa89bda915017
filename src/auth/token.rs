//! The session token stored in the auth cookie.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::auth::{Identity, UserID};

/// Who is signed in and until when.
///
/// Serialized as JSON inside the encrypted cookie, with the expiry as an
/// RFC 3339 timestamp.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Token {
    pub user_id: UserID,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl Token {
    /// The identity handed to request handlers.
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.user_id,
            email: self.email.clone(),
        }
    }

    pub fn has_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }
}
