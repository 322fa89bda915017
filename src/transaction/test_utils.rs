//! Helpers shared by the transaction endpoint tests.

use std::{path::Path, sync::Arc};

use scraper::{ElementRef, Selector};

use crate::{
    persistence::LocalSnapshotAdapter,
    transaction::{StoreRegistry, Transaction, TransactionState, TransactionStore},
};

/// Transaction state over a snapshot file in `dir`, seeded with `transactions`.
pub(crate) fn local_state(dir: &Path, transactions: &[Transaction]) -> TransactionState {
    let adapter = LocalSnapshotAdapter::new(dir.join("transactions.json"));
    adapter.save(transactions).unwrap();
    let store = TransactionStore::local(adapter).unwrap();

    TransactionState {
        stores: Arc::new(StoreRegistry::Local(Arc::new(store))),
        local_timezone: "Etc/UTC".to_owned(),
    }
}

/// The transactions currently held by the local store in `state`.
pub(crate) fn stored_transactions(state: &TransactionState) -> Vec<Transaction> {
    state.store(None).unwrap().transactions().unwrap()
}

/// Check the income/expense radio buttons: both required, only `checked_type` checked.
#[track_caller]
pub(crate) fn assert_transaction_type_inputs(form: &ElementRef, checked_type: &str) {
    let selector = Selector::parse("input[type=radio][name=type_]").unwrap();
    let inputs = form.select(&selector).collect::<Vec<_>>();

    let mut values = inputs
        .iter()
        .filter_map(|input| input.value().attr("value"))
        .collect::<Vec<_>>();
    values.sort_unstable();
    assert_eq!(values, vec!["expense", "income"]);

    assert!(
        inputs
            .iter()
            .all(|input| input.value().attr("required").is_some()),
        "want every transaction type input to be required"
    );

    let checked = inputs
        .iter()
        .filter(|input| input.value().attr("checked").is_some())
        .filter_map(|input| input.value().attr("value"))
        .collect::<Vec<_>>();
    assert_eq!(checked, vec![checked_type]);
}
