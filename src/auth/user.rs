//! Code for creating the user table and fetching users from the database.

use std::fmt::Display;

use rusqlite::{
    Connection, ToSql,
    types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

use crate::{Error, auth::PasswordHash};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(transparent)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl ToSql for UserID {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        self.0.to_sql()
    }
}

impl FromSql for UserID {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(UserID)
    }
}

/// A normalised email address: trimmed and lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Normalise and validate `raw_email`.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidEmail] if the text does not have exactly one
    /// `@` with text on both sides, or is otherwise not an email address.
    pub fn new(raw_email: &str) -> Result<Self, Error> {
        let email = raw_email.trim().to_lowercase();

        let is_valid = match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.is_empty()
                    && !domain.contains('@')
                    && email_address::EmailAddress::is_valid(&email)
            }
            None => false,
        };

        if is_valid {
            Ok(Self(email))
        } else {
            Err(Error::InvalidEmail(raw_email.trim().to_owned()))
        }
    }

    /// Wrap an email address read back from the database.
    ///
    /// The caller should ensure that `email` was created with [EmailAddress::new].
    pub fn new_unchecked(email: &str) -> Self {
        Self(email.to_owned())
    }

    /// The address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A registered user of the live collection.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The address the user signs in with.
    pub email: EmailAddress,
    /// The user's password hash.
    pub password_hash: PasswordHash,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns:
/// - [Error::DuplicateEmail] if a user has already registered `email`,
/// - [Error::SqlError] if another SQL related error occurred.
pub fn create_user(
    email: EmailAddress,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<User, Error> {
    connection.execute(
        "INSERT INTO user (email, password) VALUES (?1, ?2)",
        (email.as_str(), password_hash.to_string()),
    )?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User {
        id,
        email,
        password_hash,
    })
}

/// Get the user who registered `email`.
///
/// # Errors
///
/// This function will return an error if:
/// - `email` does not belong to a registered user ([Error::NotFound]),
/// - there was an error trying to access the database.
pub fn get_user_by_email(email: &EmailAddress, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, email, password FROM user WHERE email = :email")?
        .query_row(&[(":email", email.as_str())], |row| {
            let id = row.get(0)?;
            let raw_email: String = row.get(1)?;
            let raw_password_hash: String = row.get(2)?;

            Ok(User {
                id,
                email: EmailAddress::new_unchecked(&raw_email),
                password_hash: PasswordHash::new_unchecked(&raw_password_hash),
            })
        })
        .map_err(|error| error.into())
}

/// Get the number of users in the database.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn count_users(connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM user;", [], |row| row.get(0))
        .map_err(|error| error.into())
}
