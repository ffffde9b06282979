//! Transactions: the entries of a user's ledger.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model, its kind and the changes that can be made to it
//! - Validation of transaction request bodies
//! - Database functions for storing and querying ledger rows
//! - Route handlers for the transaction endpoints
//!
//! Keeping the budget summary in step with the ledger is the job of
//! [crate::ledger], which the route handlers go through.

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
pub(crate) mod form;
mod get_endpoint;
pub(crate) mod list_endpoint;

pub use core::{
    NewTransaction, Transaction, TransactionKind, TransactionPatch, create_transaction_table,
    delete_transaction_row, insert_transaction, select_transaction, select_transactions,
    update_transaction_row,
};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::edit_transaction_endpoint;
pub use get_endpoint::get_transaction_endpoint;
pub use list_endpoint::list_transactions_endpoint;
