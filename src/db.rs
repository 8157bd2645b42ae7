//! Database initialization.

use rusqlite::{Connection, TransactionBehavior};

use crate::{
    Error, account::create_account_table, auth::create_user_table,
    budget::create_budget_table, category::create_category_table,
    recurring::create_recurring_transaction_table, transaction::create_transaction_table,
};

/// Create the all of the database tables for the application.
///
/// Foreign key enforcement is switched on for `connection`, since ownership and the
/// account/category references of transactions rely on it.
///
/// # Errors
/// This function may return a [rusqlite::Error] if something went wrong creating the tables.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction =
        rusqlite::Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_account_table(&transaction)?;
    create_category_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_budget_table(&transaction)?;
    create_recurring_transaction_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
