//! Defines the core data models and database queries for transactions.
//!
//! Every function that changes a transaction also updates the balance of the
//! affected accounts, so callers should run them inside an SQL transaction to
//! keep the row and the balance consistent.

use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Amount, Error,
    account::get_account,
    auth::UserID,
    category::{CategoryType, get_category},
    database_id::{AccountId, CategoryId, TransactionId},
    date_range::iso_date,
    patch::deserialize_some,
    transaction::{apply_balance_delta, balance_effect},
};

// ============================================================================
// MODELS
// ============================================================================

/// An expense or income, i.e. an event where money was either spent or earned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that owns the transaction.
    #[serde(skip)]
    pub user_id: UserID,
    /// The account the money moved in or out of.
    #[serde(rename = "account")]
    pub account_id: AccountId,
    /// The category of the transaction, e.g. "Groceries", "Salary".
    #[serde(rename = "category")]
    pub category_id: Option<CategoryId>,
    /// The amount of money spent or earned in this transaction.
    pub amount: Amount,
    /// When the transaction happened.
    #[serde(with = "iso_date")]
    pub date: Date,
    /// A free text description of the transaction.
    pub notes: String,
    /// When the transaction was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A transaction with the names of the account and category it refers to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionDetails {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub account_name: String,
    /// "Uncategorized" when the transaction has no category.
    pub category_name: String,
    pub category_type: Option<CategoryType>,
}

/// The name shown for transactions without a category.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// The data needed to create a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub account_id: AccountId,
    pub category_id: Option<CategoryId>,
    pub amount: Amount,
    pub date: Date,
    pub notes: String,
}

/// Changes to a transaction, `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TransactionUpdate {
    #[serde(rename = "account")]
    pub account_id: Option<AccountId>,
    /// `Some(None)` removes the category.
    #[serde(rename = "category", default, deserialize_with = "deserialize_some")]
    pub category_id: Option<Option<CategoryId>>,
    pub amount: Option<Amount>,
    #[serde(default, with = "iso_date::option")]
    pub date: Option<Date>,
    pub notes: Option<String>,
}

/// Filters for listing transactions, all optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    pub limit: Option<u32>,
    pub account_id: Option<AccountId>,
    pub category_id: Option<CategoryId>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            account_id INTEGER NOT NULL REFERENCES account(id) ON DELETE CASCADE,
            category_id INTEGER REFERENCES category(id) ON DELETE SET NULL,
            amount INTEGER NOT NULL,
            date TEXT NOT NULL,
            notes TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date)",
        (),
    )?;

    Ok(())
}

pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        account_id: row.get(2)?,
        category_id: row.get(3)?,
        amount: row.get(4)?,
        date: row.get(5)?,
        notes: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn map_transaction_details_row(row: &Row) -> Result<TransactionDetails, rusqlite::Error> {
    let category_name: Option<String> = row.get(9)?;

    Ok(TransactionDetails {
        transaction: map_transaction_row(row)?,
        account_name: row.get(8)?,
        category_name: category_name.unwrap_or_else(|| UNCATEGORIZED.to_owned()),
        category_type: row.get(10)?,
    })
}

const TRANSACTION_COLUMNS: &str =
    "id, user_id, account_id, category_id, amount, date, notes, created_at";

const TRANSACTION_DETAILS_QUERY: &str = "SELECT t.id, t.user_id, t.account_id, t.category_id, \
    t.amount, t.date, t.notes, t.created_at, a.name, c.name, c.type \
    FROM \"transaction\" t \
    INNER JOIN account a ON a.id = t.account_id \
    LEFT JOIN category c ON c.id = t.category_id";

/// Check that the account belongs to the user and the category is visible to them.
///
/// Returns the category's type, if there is a category.
fn check_references(
    account_id: AccountId,
    category_id: Option<CategoryId>,
    user_id: UserID,
    connection: &Connection,
) -> Result<Option<CategoryType>, Error> {
    get_account(account_id, user_id, connection).map_err(|error| match error {
        Error::NotFound => Error::InvalidAccount,
        error => error,
    })?;

    category_id
        .map(|id| {
            get_category(id, user_id, connection)
                .map(|category| category.category_type)
                .map_err(|error| match error {
                    Error::NotFound => Error::InvalidCategory,
                    error => error,
                })
        })
        .transpose()
}

fn get_category_type(
    category_id: Option<CategoryId>,
    connection: &Connection,
) -> Result<Option<CategoryType>, Error> {
    let Some(category_id) = category_id else {
        return Ok(None);
    };

    connection
        .query_row(
            "SELECT type FROM category WHERE id = ?1",
            (category_id,),
            |row| row.get(0),
        )
        .optional()
        .map_err(|error| error.into())
}

/// Create a transaction and apply its effect to the account balance.
///
/// Should be called within an SQL transaction.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAccount] if the account does not belong to the user,
/// - [Error::InvalidCategory] if the category is not visible to the user,
/// - [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    user_id: UserID,
    new_transaction: &NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let category_type = check_references(
        new_transaction.account_id,
        new_transaction.category_id,
        user_id,
        connection,
    )?;

    let transaction = connection.query_row(
        &format!(
            "INSERT INTO \"transaction\" (user_id, account_id, category_id, amount, date, notes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING {TRANSACTION_COLUMNS}"
        ),
        (
            user_id,
            new_transaction.account_id,
            new_transaction.category_id,
            new_transaction.amount,
            new_transaction.date,
            new_transaction.notes.trim(),
            OffsetDateTime::now_utc(),
        ),
        map_transaction_row,
    )?;

    apply_balance_delta(
        transaction.account_id,
        balance_effect(transaction.amount, category_type),
        connection,
    )?;

    Ok(transaction)
}

/// Get one of the user's transactions.
///
/// # Errors
/// Returns [Error::NotFound] if the transaction does not belong to the user.
pub fn get_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .query_row(
            &format!(
                "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = ?1 AND user_id = ?2"
            ),
            (id, user_id),
            map_transaction_row,
        )
        .map_err(|error| error.into())
}

/// Get one of the user's transactions with its account and category names.
///
/// # Errors
/// Returns [Error::NotFound] if the transaction does not belong to the user.
pub fn get_transaction_details(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<TransactionDetails, Error> {
    connection
        .query_row(
            &format!("{TRANSACTION_DETAILS_QUERY} WHERE t.id = ?1 AND t.user_id = ?2"),
            (id, user_id),
            map_transaction_details_row,
        )
        .map_err(|error| error.into())
}

/// List the user's transactions, newest first.
///
/// Transactions on the same date are ordered by when they were recorded.
pub fn query_transactions(
    user_id: UserID,
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<Vec<TransactionDetails>, Error> {
    // A negative limit means no limit in SQLite.
    let limit = filter.limit.map_or(-1, i64::from);

    connection
        .prepare(&format!(
            "{TRANSACTION_DETAILS_QUERY}
             WHERE t.user_id = ?1
                AND (?2 IS NULL OR t.account_id = ?2)
                AND (?3 IS NULL OR t.category_id = ?3)
                AND (?4 IS NULL OR t.date >= ?4)
                AND (?5 IS NULL OR t.date <= ?5)
             ORDER BY t.date DESC, t.created_at DESC, t.id DESC
             LIMIT ?6"
        ))?
        .query_map(
            (
                user_id,
                filter.account_id,
                filter.category_id,
                filter.start_date,
                filter.end_date,
                limit,
            ),
            map_transaction_details_row,
        )?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| error.into())
}

/// Apply `update` to one of the user's transactions and move the account balances
/// to match.
///
/// If the account changed, the old effect is reversed on the old account and the new
/// effect applied to the new account. Otherwise only the difference is applied.
/// Should be called within an SQL transaction.
///
/// # Errors
/// Returns a:
/// - [Error::NotFound] if the transaction does not belong to the user,
/// - [Error::InvalidAccount] or [Error::InvalidCategory] for bad references.
pub fn update_transaction(
    id: TransactionId,
    user_id: UserID,
    update: &TransactionUpdate,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let old = get_transaction(id, user_id, connection)?;
    let old_category_type = get_category_type(old.category_id, connection)?;

    let account_id = update.account_id.unwrap_or(old.account_id);
    let category_id = update.category_id.unwrap_or(old.category_id);
    let amount = update.amount.unwrap_or(old.amount);
    let date = update.date.unwrap_or(old.date);
    let notes = update
        .notes
        .as_deref()
        .map(str::trim)
        .unwrap_or(&old.notes);

    let new_category_type = check_references(account_id, category_id, user_id, connection)?;

    let transaction = connection.query_row(
        &format!(
            "UPDATE \"transaction\"
             SET account_id = ?1, category_id = ?2, amount = ?3, date = ?4, notes = ?5
             WHERE id = ?6 AND user_id = ?7
             RETURNING {TRANSACTION_COLUMNS}"
        ),
        (account_id, category_id, amount, date, notes, id, user_id),
        map_transaction_row,
    )?;

    let old_effect = balance_effect(old.amount, old_category_type);
    let new_effect = balance_effect(transaction.amount, new_category_type);

    if old.account_id != transaction.account_id {
        apply_balance_delta(old.account_id, -old_effect, connection)?;
        apply_balance_delta(transaction.account_id, new_effect, connection)?;
    } else {
        apply_balance_delta(transaction.account_id, new_effect - old_effect, connection)?;
    }

    Ok(transaction)
}

/// Delete one of the user's transactions and reverse its effect on the account balance.
///
/// Should be called within an SQL transaction.
///
/// # Errors
/// Returns [Error::NotFound] if the transaction does not belong to the user.
pub fn delete_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let transaction = get_transaction(id, user_id, connection)?;
    let category_type = get_category_type(transaction.category_id, connection)?;

    connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        (id, user_id),
    )?;

    apply_balance_delta(
        transaction.account_id,
        -balance_effect(transaction.amount, category_type),
        connection,
    )?;

    Ok(())
}

/// Find the oldest of the user's transactions in `account_id` with the same amount,
/// and the same date if `date` is given.
pub fn find_duplicate_transaction(
    user_id: UserID,
    account_id: AccountId,
    amount: Amount,
    date: Option<Date>,
    connection: &Connection,
) -> Result<Option<Transaction>, Error> {
    connection
        .query_row(
            &format!(
                "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
                 WHERE user_id = ?1 AND account_id = ?2 AND amount = ?3
                    AND (?4 IS NULL OR date = ?4)
                 ORDER BY id
                 LIMIT 1"
            ),
            (user_id, account_id, amount, date),
            map_transaction_row,
        )
        .optional()
        .map_err(|error| error.into())
}
