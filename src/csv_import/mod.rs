//! Importing transactions from CSV files.

mod import_transactions;
mod parse;

pub use import_transactions::import_transactions_endpoint;
