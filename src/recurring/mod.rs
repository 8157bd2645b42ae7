//! Transactions that repeat daily, weekly or monthly.

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod list_endpoint;
mod process;
mod process_endpoint;
mod schedule;

pub use core::{
    NewRecurringTransaction, RecurringTransaction, RecurringTransactionUpdate,
    create_recurring_transaction, create_recurring_transaction_table,
    delete_recurring_transaction, get_recurring_transaction, get_recurring_transactions,
    update_recurring_transaction,
};
pub use create_endpoint::create_recurring_transaction_endpoint;
pub use delete_endpoint::delete_recurring_transaction_endpoint;
pub use edit_endpoint::edit_recurring_transaction_endpoint;
pub use list_endpoint::{get_recurring_transaction_endpoint, get_recurring_transactions_endpoint};
pub use process::{
    ProcessSummary, materialize_due_occurrences, process_all_due_recurring_transactions,
    process_due_recurring_transactions,
};
pub use process_endpoint::process_recurring_transactions_endpoint;
pub use schedule::{Frequency, next_occurrence};
