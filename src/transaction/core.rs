//! The transaction record and the values used to create and edit one.

use std::fmt::Display;

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{Error, auth::UserID, transaction::Category};

/// Uniquely identifies a transaction within its collection.
///
/// The local snapshot uses the creation time in Unix milliseconds, the live
/// collection uses the SQLite row ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(i64);

impl TransactionId {
    /// Wrap a raw ID read from storage or a URL.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// The raw ID, for URLs and SQL parameters.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl ToSql for TransactionId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        self.0.to_sql()
    }
}

impl FromSql for TransactionId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(TransactionId)
    }
}

/// Whether money came in or went out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money received.
    Income,
    /// Money spent.
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TransactionType::Income => "Income",
            TransactionType::Expense => "Expense",
        }
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

/// A single recorded income or expense event.
///
/// The JSON form of this struct is the local snapshot format and the export
/// file format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Immutable, unique within the collection.
    pub id: TransactionId,
    /// Whether this is income or an expense.
    #[serde(rename = "type")]
    pub type_: TransactionType,
    /// Free text shown in the list.
    #[serde(default)]
    pub description: String,
    /// The magnitude of the transaction, the sign comes from `type_`.
    pub amount: f64,
    /// What the transaction was for.
    #[serde(default)]
    pub category: Category,
    /// The day the transaction happened.
    pub date: Date,
    /// When the record was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the record was last edited, if ever.
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<OffsetDateTime>,
    /// The user who created the record, live collection only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<UserID>,
    /// The email of the user who created the record, live collection only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_email: Option<String>,
}

impl Transaction {
    /// Create a record from user input.
    pub fn from_fields(
        id: TransactionId,
        fields: TransactionFields,
        attribution: Attribution,
        created_at: OffsetDateTime,
    ) -> Self {
        Self {
            id,
            type_: fields.type_,
            description: fields.description,
            amount: fields.amount,
            category: fields.category,
            date: fields.date,
            created_at,
            updated_at: None,
            owner_id: attribution.owner_id,
            owner_email: attribution.owner_email,
        }
    }

    /// Replace every user editable field and refresh `updated_at`.
    ///
    /// The ID, creation time and attribution are left as they are.
    pub fn apply_edit(&mut self, fields: TransactionFields, updated_at: OffsetDateTime) {
        self.type_ = fields.type_;
        self.description = fields.description;
        self.amount = fields.amount;
        self.category = fields.category;
        self.date = fields.date;
        self.updated_at = Some(updated_at);
    }

    /// The amount with income positive and expenses negative.
    pub fn signed_amount(&self) -> f64 {
        match self.type_ {
            TransactionType::Income => self.amount,
            TransactionType::Expense => -self.amount,
        }
    }
}

/// The part of a transaction that the user fills in.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionFields {
    /// Whether this is income or an expense.
    pub type_: TransactionType,
    /// Free text shown in the list.
    pub description: String,
    /// A non-negative magnitude.
    pub amount: f64,
    /// What the transaction was for.
    pub category: Category,
    /// The day the transaction happened.
    pub date: Date,
}

impl TransactionFields {
    /// Check the user input and trim the description.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidAmount] if `amount` is negative, infinite or NaN.
    pub fn new(
        type_: TransactionType,
        description: &str,
        amount: f64,
        category: Category,
        date: Date,
    ) -> Result<Self, Error> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(Error::InvalidAmount(amount));
        }

        Ok(Self {
            type_,
            description: description.trim().to_owned(),
            amount,
            category,
            date,
        })
    }
}

/// Who created a transaction. Empty for the local snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attribution {
    /// The creator's user ID.
    pub owner_id: Option<UserID>,
    /// The creator's email address.
    pub owner_email: Option<String>,
}

/// The ID for a new local transaction: the creation time in Unix milliseconds,
/// bumped past the largest existing ID so IDs stay unique and increasing.
pub fn next_local_id(transactions: &[Transaction], now: OffsetDateTime) -> TransactionId {
    let now_ms = (now.unix_timestamp_nanos() / 1_000_000) as i64;

    let next = match transactions.iter().map(|transaction| transaction.id).max() {
        Some(largest) => now_ms.max(largest.as_i64() + 1),
        None => now_ms,
    };

    TransactionId::new(next)
}

#[cfg(test)]
pub(crate) fn test_transaction(
    id: i64,
    type_: TransactionType,
    amount: f64,
    category: Category,
    date: Date,
) -> Transaction {
    Transaction {
        id: TransactionId::new(id),
        type_,
        description: format!("transaction {id}"),
        amount,
        category,
        date,
        created_at: date.midnight().assume_utc(),
        updated_at: None,
        owner_id: None,
        owner_email: None,
    }
}
