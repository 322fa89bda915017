//! Transactions and everything that changes them.
//!
//! This module contains:
//! - The `Transaction` record, its categories and the dashboard filters
//! - `TransactionStore`, which keeps the list in sync with the storage backend
//! - The route handlers for creating, editing, deleting, exporting and importing transactions

mod category;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod edit_page;
mod export;
mod filter;
mod form;
mod registry;
mod store;

pub(crate) mod core;

#[cfg(test)]
pub(crate) mod test_utils;

pub use category::Category;
pub use core::{
    Attribution, Transaction, TransactionFields, TransactionId, TransactionType, next_local_id,
};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::{clear_transactions_endpoint, delete_transaction_endpoint};
pub use edit_endpoint::edit_transaction_endpoint;
pub use edit_page::get_edit_transaction_page;
pub use export::{export_transactions, import_transactions};
pub use filter::{CategoryFilter, FilterCriteria, Period, TypeFilter, filter_transactions};
pub use form::{TransactionForm, TransactionFormDefaults, transaction_form_fields};
pub use registry::{StoreRegistry, TransactionState};
pub use store::TransactionStore;
