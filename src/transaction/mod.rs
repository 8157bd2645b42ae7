//! Transactions record money moving in or out of an account.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and the queries for storing and listing transactions
//! - The balance-effect rule that keeps account balances in sync
//! - The route handlers for the transactions API

mod balance;
mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod list_endpoint;

pub use balance::{apply_balance_delta, balance_effect};
pub use core::{
    NewTransaction, Transaction, TransactionDetails, TransactionFilter, TransactionUpdate,
    create_transaction, create_transaction_table, delete_transaction, find_duplicate_transaction,
    get_transaction_details, query_transactions, update_transaction,
};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::edit_transaction_endpoint;
pub use list_endpoint::{get_transaction_endpoint, get_transactions_endpoint};
