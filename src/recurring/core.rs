//! The recurring transaction model and its database queries.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Amount, Error,
    account::get_account,
    auth::UserID,
    category::get_category,
    database_id::{AccountId, CategoryId, RecurringTransactionId},
    date_range::{DateRange, iso_date, parse_iso_date},
    patch::deserialize_some,
    recurring::Frequency,
};

/// A transaction that repeats on a schedule, e.g. rent or a salary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecurringTransaction {
    pub id: RecurringTransactionId,
    #[serde(skip)]
    pub user_id: UserID,
    #[serde(rename = "account")]
    pub account_id: AccountId,
    #[serde(rename = "category")]
    pub category_id: Option<CategoryId>,
    pub amount: Amount,
    pub notes: String,
    pub frequency: Frequency,
    /// The first occurrence, which also sets the day of the month for monthly schedules.
    #[serde(with = "iso_date")]
    pub start_date: Date,
    /// The next occurrence that has not been turned into a transaction yet.
    #[serde(with = "iso_date")]
    pub next_date: Date,
    /// The last date an occurrence may fall on, if any.
    #[serde(with = "iso_date::option")]
    pub end_date: Option<Date>,
    /// Inactive schedules are skipped when processing.
    pub active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The data needed to create a recurring transaction.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewRecurringTransaction {
    #[serde(rename = "account")]
    pub account_id: AccountId,
    #[serde(rename = "category", default)]
    pub category_id: Option<CategoryId>,
    pub amount: Amount,
    #[serde(default)]
    pub notes: String,
    pub frequency: Frequency,
    #[serde(with = "iso_date")]
    pub start_date: Date,
    #[serde(default, with = "iso_date::option")]
    pub end_date: Option<Date>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Changes to a recurring transaction, `None` fields are left as they are.
///
/// The start and next dates cannot be changed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RecurringTransactionUpdate {
    #[serde(rename = "account")]
    pub account_id: Option<AccountId>,
    /// `Some(None)` removes the category.
    #[serde(rename = "category", default, deserialize_with = "deserialize_some")]
    pub category_id: Option<Option<CategoryId>>,
    pub amount: Option<Amount>,
    pub notes: Option<String>,
    pub frequency: Option<Frequency>,
    /// An ISO date, or `null` to remove the end date.
    #[serde(default, deserialize_with = "deserialize_some")]
    pub end_date: Option<Option<String>>,
    pub active: Option<bool>,
}

pub fn create_recurring_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS recurring_transaction (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            account_id INTEGER NOT NULL REFERENCES account(id) ON DELETE CASCADE,
            category_id INTEGER REFERENCES category(id) ON DELETE SET NULL,
            amount INTEGER NOT NULL,
            notes TEXT NOT NULL DEFAULT '',
            frequency TEXT NOT NULL,
            start_date TEXT NOT NULL,
            next_date TEXT NOT NULL,
            end_date TEXT,
            active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_recurring_transaction_due
         ON recurring_transaction(active, next_date)",
        (),
    )?;

    Ok(())
}

pub(crate) const RECURRING_TRANSACTION_COLUMNS: &str = "id, user_id, account_id, category_id, \
    amount, notes, frequency, start_date, next_date, end_date, active, created_at";

pub(crate) fn map_recurring_transaction_row(
    row: &Row,
) -> Result<RecurringTransaction, rusqlite::Error> {
    Ok(RecurringTransaction {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        account_id: row.get(2)?,
        category_id: row.get(3)?,
        amount: row.get(4)?,
        notes: row.get(5)?,
        frequency: row.get(6)?,
        start_date: row.get(7)?,
        next_date: row.get(8)?,
        end_date: row.get(9)?,
        active: row.get(10)?,
        created_at: row.get(11)?,
    })
}

fn check_references(
    account_id: AccountId,
    category_id: Option<CategoryId>,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    get_account(account_id, user_id, connection).map_err(|error| match error {
        Error::NotFound => Error::InvalidAccount,
        error => error,
    })?;

    if let Some(category_id) = category_id {
        get_category(category_id, user_id, connection).map_err(|error| match error {
            Error::NotFound => Error::InvalidCategory,
            error => error,
        })?;
    }

    Ok(())
}

/// Create a recurring transaction whose first occurrence is its start date.
///
/// Due occurrences are not created here, see
/// [materialize_due_occurrences](crate::recurring::materialize_due_occurrences).
///
/// # Errors
/// Returns a:
/// - [Error::InvalidAccount] or [Error::InvalidCategory] for references the user cannot use,
/// - [Error::InvalidDateRange] if the end date is before the start date.
pub fn create_recurring_transaction(
    user_id: UserID,
    new: &NewRecurringTransaction,
    connection: &Connection,
) -> Result<RecurringTransaction, Error> {
    check_references(new.account_id, new.category_id, user_id, connection)?;

    if let Some(end_date) = new.end_date {
        DateRange::new(new.start_date, end_date)?;
    }

    connection
        .query_row(
            &format!(
                "INSERT INTO recurring_transaction
                    (user_id, account_id, category_id, amount, notes, frequency,
                     start_date, next_date, end_date, active, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7, ?8, ?9, ?10)
                 RETURNING {RECURRING_TRANSACTION_COLUMNS}"
            ),
            (
                user_id,
                new.account_id,
                new.category_id,
                new.amount,
                new.notes.trim(),
                new.frequency,
                new.start_date,
                new.end_date,
                new.active,
                OffsetDateTime::now_utc(),
            ),
            map_recurring_transaction_row,
        )
        .map_err(|error| error.into())
}

/// Get one of the user's recurring transactions.
///
/// # Errors
/// Returns [Error::NotFound] if it does not belong to the user.
pub fn get_recurring_transaction(
    id: RecurringTransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<RecurringTransaction, Error> {
    connection
        .query_row(
            &format!(
                "SELECT {RECURRING_TRANSACTION_COLUMNS} FROM recurring_transaction
                 WHERE id = ?1 AND user_id = ?2"
            ),
            (id, user_id),
            map_recurring_transaction_row,
        )
        .map_err(|error| error.into())
}

/// Get the user's recurring transactions, soonest due first.
pub fn get_recurring_transactions(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<RecurringTransaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {RECURRING_TRANSACTION_COLUMNS} FROM recurring_transaction
             WHERE user_id = ?1
             ORDER BY next_date, id"
        ))?
        .query_map((user_id,), map_recurring_transaction_row)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| error.into())
}

/// Apply `update` to one of the user's recurring transactions.
///
/// # Errors
/// Returns [Error::NotFound] if it does not belong to the user, or the same
/// validation errors as [create_recurring_transaction].
pub fn update_recurring_transaction(
    id: RecurringTransactionId,
    user_id: UserID,
    update: &RecurringTransactionUpdate,
    connection: &Connection,
) -> Result<RecurringTransaction, Error> {
    let existing = get_recurring_transaction(id, user_id, connection)?;

    let account_id = update.account_id.unwrap_or(existing.account_id);
    let category_id = update.category_id.unwrap_or(existing.category_id);
    let end_date = match &update.end_date {
        Some(Some(text)) => Some(parse_iso_date(text)?),
        Some(None) => None,
        None => existing.end_date,
    };

    check_references(account_id, category_id, user_id, connection)?;

    if let Some(end_date) = end_date {
        DateRange::new(existing.start_date, end_date)?;
    }

    connection
        .query_row(
            &format!(
                "UPDATE recurring_transaction SET
                    account_id = ?1,
                    category_id = ?2,
                    amount = ?3,
                    notes = ?4,
                    frequency = ?5,
                    end_date = ?6,
                    active = ?7
                 WHERE id = ?8 AND user_id = ?9
                 RETURNING {RECURRING_TRANSACTION_COLUMNS}"
            ),
            (
                account_id,
                category_id,
                update.amount.unwrap_or(existing.amount),
                update
                    .notes
                    .as_deref()
                    .map(str::trim)
                    .unwrap_or(&existing.notes),
                update.frequency.unwrap_or(existing.frequency),
                end_date,
                update.active.unwrap_or(existing.active),
                id,
                user_id,
            ),
            map_recurring_transaction_row,
        )
        .map_err(|error| error.into())
}

/// Delete one of the user's recurring transactions.
///
/// Transactions it already created are kept.
///
/// # Errors
/// Returns [Error::NotFound] if it does not belong to the user.
pub fn delete_recurring_transaction(
    id: RecurringTransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM recurring_transaction WHERE id = ?1 AND user_id = ?2",
        (id, user_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Amount, Error,
        account::{Account, NewAccount, create_account},
        auth::UserID,
        recurring::Frequency,
        test_utils::{get_test_connection, must_create_test_user},
    };

    use super::{
        NewRecurringTransaction, RecurringTransactionUpdate, create_recurring_transaction,
        delete_recurring_transaction, get_recurring_transaction, get_recurring_transactions,
        update_recurring_transaction,
    };

    fn setup() -> (Connection, UserID, Account) {
        let connection = get_test_connection();
        let user_id = must_create_test_user(&connection, "alice").id;
        let account = create_account(
            user_id,
            &NewAccount {
                name: "Everyday".to_owned(),
                account_type: Default::default(),
                currency: None,
                balance: Amount::ZERO,
            },
            &connection,
        )
        .unwrap();

        (connection, user_id, account)
    }

    fn rent(account: &Account) -> NewRecurringTransaction {
        NewRecurringTransaction {
            account_id: account.id,
            category_id: None,
            amount: Amount::from_cents(-150_000),
            notes: "Rent".to_owned(),
            frequency: Frequency::Monthly,
            start_date: date!(2025 - 01 - 31),
            end_date: None,
            active: true,
        }
    }

    #[test]
    fn next_date_starts_at_start_date() {
        let (connection, user_id, account) = setup();

        let recurring = create_recurring_transaction(user_id, &rent(&account), &connection)
            .unwrap();

        assert_eq!(recurring.next_date, date!(2025 - 01 - 31));
        assert_eq!(
            get_recurring_transaction(recurring.id, user_id, &connection),
            Ok(recurring)
        );
    }

    #[test]
    fn rejects_end_before_start() {
        let (connection, user_id, account) = setup();
        let new = NewRecurringTransaction {
            end_date: Some(date!(2025 - 01 - 01)),
            ..rent(&account)
        };

        assert_eq!(
            create_recurring_transaction(user_id, &new, &connection),
            Err(Error::InvalidDateRange {
                start: date!(2025 - 01 - 31),
                end: date!(2025 - 01 - 01)
            })
        );
    }

    #[test]
    fn rejects_another_users_account() {
        let (connection, _, account) = setup();
        let bob = must_create_test_user(&connection, "bob").id;

        assert_eq!(
            create_recurring_transaction(bob, &rent(&account), &connection),
            Err(Error::InvalidAccount)
        );
    }

    #[test]
    fn update_keeps_missing_fields_and_clears_end_date() {
        let (connection, user_id, account) = setup();
        let recurring = create_recurring_transaction(
            user_id,
            &NewRecurringTransaction {
                end_date: Some(date!(2025 - 12 - 31)),
                ..rent(&account)
            },
            &connection,
        )
        .unwrap();

        let updated = update_recurring_transaction(
            recurring.id,
            user_id,
            &RecurringTransactionUpdate {
                amount: Some(Amount::from_cents(-160_000)),
                end_date: Some(None),
                active: Some(false),
                ..Default::default()
            },
            &connection,
        )
        .unwrap();

        assert_eq!(updated.amount, Amount::from_cents(-160_000));
        assert_eq!(updated.notes, "Rent");
        assert_eq!(updated.end_date, None);
        assert!(!updated.active);
        assert_eq!(updated.next_date, recurring.next_date);
    }

    #[test]
    fn list_and_delete_are_scoped_to_owner() {
        let (connection, user_id, account) = setup();
        let bob = must_create_test_user(&connection, "bob").id;
        let recurring = create_recurring_transaction(user_id, &rent(&account), &connection)
            .unwrap();

        assert!(get_recurring_transactions(bob, &connection).unwrap().is_empty());
        assert_eq!(
            delete_recurring_transaction(recurring.id, bob, &connection),
            Err(Error::NotFound)
        );

        delete_recurring_transaction(recurring.id, user_id, &connection).unwrap();
        assert!(
            get_recurring_transactions(user_id, &connection)
                .unwrap()
                .is_empty()
        );
    }
}
