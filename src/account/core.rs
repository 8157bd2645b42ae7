//! Accounts hold money, e.g. a bank account, a wallet or a credit card.
//!
//! Each account stores a running balance that transactions update as they are
//! created, edited and deleted.

use std::str::FromStr;

use rusqlite::{
    Connection, OptionalExtension, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Amount, Error, auth::UserID, database_id::AccountId};

/// The currency used for accounts created without one.
pub const DEFAULT_CURRENCY: &str = "USD";

/// The kind of place the money is kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    #[default]
    Bank,
    Cash,
    Credit,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Bank => "bank",
            AccountType::Cash => "cash",
            AccountType::Credit => "credit",
        }
    }
}

impl FromStr for AccountType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bank" => Ok(AccountType::Bank),
            "cash" => Ok(AccountType::Cash),
            "credit" => Ok(AccountType::Credit),
            _ => Err(Error::InvalidAccountType(s.to_owned())),
        }
    }
}

impl ToSql for AccountType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for AccountType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// A place where a user keeps money.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    pub id: AccountId,
    #[serde(skip)]
    pub user_id: UserID,
    pub name: String,
    pub account_type: AccountType,
    /// A three letter currency code, e.g. "NZD".
    pub currency: String,
    /// The balance, kept in sync with the account's transactions.
    pub balance: Amount,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The data needed to create an account.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAccount {
    pub name: String,
    #[serde(default)]
    pub account_type: AccountType,
    pub currency: Option<String>,
    /// The opening balance.
    #[serde(default)]
    pub balance: Amount,
}

/// Changes to an account, `None` fields are left as they are.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountUpdate {
    pub name: Option<String>,
    pub account_type: Option<AccountType>,
    pub currency: Option<String>,
    /// Overwrites the balance directly, e.g. to reconcile with a bank statement.
    pub balance: Option<Amount>,
}

pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            account_type TEXT NOT NULL,
            currency TEXT NOT NULL,
            balance INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(user_id, name)
        )",
        (),
    )?;

    Ok(())
}

pub fn map_account_row(row: &Row) -> Result<Account, rusqlite::Error> {
    Ok(Account {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        name: row.get(2)?,
        account_type: row.get(3)?,
        currency: row.get(4)?,
        balance: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

const ACCOUNT_COLUMNS: &str =
    "id, user_id, name, account_type, currency, balance, created_at, updated_at";

/// Upper-case `currency` and check that it is a three letter code.
///
/// # Errors
/// Returns [Error::InvalidCurrency] if the code is not three ASCII letters.
pub fn validate_currency(currency: &str) -> Result<String, Error> {
    let code = currency.trim().to_ascii_uppercase();

    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(Error::InvalidCurrency(currency.to_owned()));
    }

    Ok(code)
}

fn validate_name(name: &str) -> Result<String, Error> {
    let name = name.trim();

    if name.is_empty() {
        return Err(Error::EmptyField("account name"));
    }

    Ok(name.to_owned())
}

fn map_unique_name_error(error: rusqlite::Error, name: &str) -> Error {
    match error {
        // Code 2067 occurs when a UNIQUE constraint failed.
        rusqlite::Error::SqliteFailure(sql_error, Some(_)) if sql_error.extended_code == 2067 => {
            Error::DuplicateAccountName(name.to_owned())
        }
        error => error.into(),
    }
}

/// Create an account for `user_id`.
///
/// # Errors
/// Returns a:
/// - [Error::EmptyField] if the name is blank,
/// - [Error::InvalidCurrency] if the currency is not a three letter code,
/// - [Error::DuplicateAccountName] if the user already has an account with that name,
/// - [Error::SqlError] if there is some other SQL error.
pub fn create_account(
    user_id: UserID,
    account: &NewAccount,
    connection: &Connection,
) -> Result<Account, Error> {
    let name = validate_name(&account.name)?;
    let currency = validate_currency(account.currency.as_deref().unwrap_or(DEFAULT_CURRENCY))?;
    let now = OffsetDateTime::now_utc();

    connection
        .query_row(
            &format!(
                "INSERT INTO account (user_id, name, account_type, currency, balance, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
                 RETURNING {ACCOUNT_COLUMNS}"
            ),
            (
                user_id,
                &name,
                account.account_type,
                &currency,
                account.balance,
                now,
            ),
            map_account_row,
        )
        .map_err(|error| map_unique_name_error(error, &name))
}

/// Get one of the user's accounts.
///
/// # Errors
/// Returns [Error::NotFound] if the account does not exist or belongs to someone else.
pub fn get_account(
    id: AccountId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Account, Error> {
    connection
        .query_row(
            &format!("SELECT {ACCOUNT_COLUMNS} FROM account WHERE id = ?1 AND user_id = ?2"),
            (id, user_id),
            map_account_row,
        )
        .map_err(|error| error.into())
}

/// Get the user's accounts, most recently updated first.
pub fn get_accounts(user_id: UserID, connection: &Connection) -> Result<Vec<Account>, Error> {
    connection
        .prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM account WHERE user_id = ?1
             ORDER BY updated_at DESC, id DESC"
        ))?
        .query_map((user_id,), map_account_row)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| error.into())
}

/// Find one of the user's accounts by name, or create it with the default type,
/// currency and a zero balance.
pub fn get_or_create_account_by_name(
    name: &str,
    user_id: UserID,
    connection: &Connection,
) -> Result<Account, Error> {
    let name = validate_name(name)?;

    let existing = connection
        .query_row(
            &format!("SELECT {ACCOUNT_COLUMNS} FROM account WHERE name = ?1 AND user_id = ?2"),
            (&name, user_id),
            map_account_row,
        )
        .optional()?;

    match existing {
        Some(account) => Ok(account),
        None => {
            tracing::debug!("Creating account \"{name}\" for user {user_id}");
            create_account(
                user_id,
                &NewAccount {
                    name,
                    account_type: AccountType::default(),
                    currency: None,
                    balance: Amount::ZERO,
                },
                connection,
            )
        }
    }
}

/// Apply `update` to one of the user's accounts.
///
/// # Errors
/// Returns [Error::NotFound] if the account does not belong to the user, or the
/// same validation errors as [create_account].
pub fn update_account(
    id: AccountId,
    user_id: UserID,
    update: &AccountUpdate,
    connection: &Connection,
) -> Result<Account, Error> {
    let name = update.name.as_deref().map(validate_name).transpose()?;
    let currency = update
        .currency
        .as_deref()
        .map(validate_currency)
        .transpose()?;

    connection
        .query_row(
            &format!(
                "UPDATE account SET
                    name = COALESCE(?1, name),
                    account_type = COALESCE(?2, account_type),
                    currency = COALESCE(?3, currency),
                    balance = COALESCE(?4, balance),
                    updated_at = ?5
                 WHERE id = ?6 AND user_id = ?7
                 RETURNING {ACCOUNT_COLUMNS}"
            ),
            (
                &name,
                update.account_type,
                &currency,
                update.balance,
                OffsetDateTime::now_utc(),
                id,
                user_id,
            ),
            map_account_row,
        )
        .map_err(|error| map_unique_name_error(error, name.as_deref().unwrap_or_default()))
}

/// Delete one of the user's accounts together with its transactions and
/// recurring transactions.
///
/// # Errors
/// Returns [Error::NotFound] if the account does not belong to the user.
pub fn delete_account(id: AccountId, user_id: UserID, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM account WHERE id = ?1 AND user_id = ?2",
        (id, user_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Get the total balance across all of the user's accounts.
pub fn get_total_account_balance(user_id: UserID, connection: &Connection) -> Result<Amount, Error> {
    connection
        .query_row(
            "SELECT COALESCE(SUM(balance), 0) FROM account WHERE user_id = ?1",
            (user_id,),
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}
