//! Categories group transactions as income or expenses.
//!
//! A category either belongs to one user or is shared (has no owner). Shared
//! categories are visible to and usable by every user, but nobody can change them
//! through the API.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, OptionalExtension, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize, Serializer};

use crate::{
    Amount, Error,
    auth::UserID,
    database_id::{AccountId, CategoryId},
    transaction::{apply_balance_delta, balance_effect},
};

/// The colour used for categories created without one.
pub const DEFAULT_CATEGORY_COLOR: &str = "#cccccc";

/// Whether money in a category is earned or spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryType {
    /// Money coming in, e.g. wages.
    Income,
    /// Money going out, e.g. groceries.
    Expense,
}

impl CategoryType {
    /// The lowercase name used in JSON, CSV files and the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryType::Income => "income",
            CategoryType::Expense => "expense",
        }
    }
}

impl Display for CategoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(CategoryType::Income),
            "expense" => Ok(CategoryType::Expense),
            _ => Err(Error::InvalidCategoryType(s.to_owned())),
        }
    }
}

impl ToSql for CategoryType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for CategoryType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// A label for transactions, e.g. "Groceries" or "Salary".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The owner, or `None` for a shared category.
    #[serde(rename = "shared", serialize_with = "serialize_is_shared")]
    pub user_id: Option<UserID>,
    /// The name, unique among the categories a user owns.
    pub name: String,
    /// Whether the category is for income or expenses.
    #[serde(rename = "type")]
    pub category_type: CategoryType,
    /// A hex colour such as "#4caf50".
    pub color: String,
}

fn serialize_is_shared<S>(user_id: &Option<UserID>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_bool(user_id.is_none())
}

/// The data needed to create a category, or replace all of its fields.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    /// The name of the category.
    pub name: String,
    /// Whether the category is for income or expenses.
    #[serde(rename = "type")]
    pub category_type: CategoryType,
    /// A hex colour, or `None` for the default colour.
    pub color: Option<String>,
}

pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            user_id INTEGER REFERENCES user(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            type TEXT NOT NULL,
            color TEXT NOT NULL DEFAULT '#cccccc',
            UNIQUE(user_id, name)
        )",
        (),
    )?;

    // UNIQUE treats NULLs as distinct, so shared names need their own index.
    connection.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_shared_category_name
         ON category(name) WHERE user_id IS NULL",
        (),
    )?;

    Ok(())
}

pub fn map_category_row(row: &Row) -> Result<Category, rusqlite::Error> {
    Ok(Category {
        id: row.get(0)?,
        user_id: row.get::<_, Option<i64>>(1)?.map(UserID::new),
        name: row.get(2)?,
        category_type: row.get(3)?,
        color: row.get(4)?,
    })
}

/// Normalise a colour such as "#AABBCC" to lowercase, defaulting to [DEFAULT_CATEGORY_COLOR].
///
/// # Errors
/// Returns [Error::InvalidColor] if `color` is not a '#' followed by six hex digits.
pub fn validate_color(color: Option<&str>) -> Result<String, Error> {
    let Some(color) = color.map(str::trim).filter(|color| !color.is_empty()) else {
        return Ok(DEFAULT_CATEGORY_COLOR.to_owned());
    };

    let is_valid = color
        .strip_prefix('#')
        .is_some_and(|hex| hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()));

    if !is_valid {
        return Err(Error::InvalidColor(color.to_owned()));
    }

    Ok(color.to_lowercase())
}

fn validate_name(name: &str) -> Result<String, Error> {
    let name = name.trim();

    if name.is_empty() {
        return Err(Error::EmptyField("category name"));
    }

    Ok(name.to_owned())
}

fn map_unique_name_error(error: rusqlite::Error, name: &str) -> Error {
    match error {
        rusqlite::Error::SqliteFailure(sql_error, Some(_))
            if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            Error::DuplicateCategoryName(name.to_owned())
        }
        error => error.into(),
    }
}

/// Create a category owned by `user_id`, or a shared category if `user_id` is `None`.
///
/// # Errors
/// Returns a:
/// - [Error::EmptyField] if the name is blank,
/// - [Error::InvalidColor] if the colour is malformed,
/// - [Error::DuplicateCategoryName] if the owner already has a category with that name,
/// - [Error::SqlError] if there is some other SQL error.
pub fn create_category(
    user_id: Option<UserID>,
    category: &NewCategory,
    connection: &Connection,
) -> Result<Category, Error> {
    let name = validate_name(&category.name)?;
    let color = validate_color(category.color.as_deref())?;

    connection
        .query_row(
            "INSERT INTO category (user_id, name, type, color) VALUES (?1, ?2, ?3, ?4)
             RETURNING id, user_id, name, type, color",
            (user_id, &name, category.category_type, &color),
            map_category_row,
        )
        .map_err(|error| map_unique_name_error(error, &name))
}

/// Get a category that `user_id` may use: one of their own, or a shared one.
///
/// # Errors
/// Returns [Error::NotFound] if there is no such category visible to the user.
pub fn get_category(
    id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .query_row(
            "SELECT id, user_id, name, type, color FROM category
             WHERE id = ?1 AND (user_id = ?2 OR user_id IS NULL)",
            (id, user_id),
            map_category_row,
        )
        .map_err(|error| error.into())
}

/// Get the user's own categories followed by the shared ones, each sorted by name.
pub fn get_categories(user_id: UserID, connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, type, color FROM category
             WHERE user_id = ?1 OR user_id IS NULL
             ORDER BY user_id IS NULL, name COLLATE NOCASE",
        )?
        .query_map((user_id,), map_category_row)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| error.into())
}

/// Get only the categories owned by `user_id`, sorted by name.
pub fn get_own_categories(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, type, color FROM category
             WHERE user_id = ?1
             ORDER BY name COLLATE NOCASE",
        )?
        .query_map((user_id,), map_category_row)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| error.into())
}

/// Find a category visible to `user_id` by name, preferring the user's own category
/// over a shared one with the same name.
pub fn find_category_by_name(
    name: &str,
    user_id: UserID,
    connection: &Connection,
) -> Result<Option<Category>, Error> {
    connection
        .query_row(
            "SELECT id, user_id, name, type, color FROM category
             WHERE name = ?1 AND (user_id = ?2 OR user_id IS NULL)
             ORDER BY user_id IS NULL
             LIMIT 1",
            (name.trim(), user_id),
            map_category_row,
        )
        .optional()
        .map_err(|error| error.into())
}

/// Get a category the user is allowed to modify.
fn get_own_category(
    id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    let category = get_category(id, user_id, connection)?;

    if category.user_id.is_none() {
        return Err(Error::SharedCategoryReadOnly);
    }

    Ok(category)
}

/// Adjust account balances for a change in how the transactions of `category_id`
/// affect them, e.g. when the category's type changes or it is removed.
///
/// Should be called within an SQL transaction.
fn rebase_category_balances(
    category_id: CategoryId,
    old_type: Option<CategoryType>,
    new_type: Option<CategoryType>,
    connection: &Connection,
) -> Result<(), Error> {
    if old_type == new_type {
        return Ok(());
    }

    let totals = connection
        .prepare(
            "SELECT account_id, SUM(amount) FROM \"transaction\"
             WHERE category_id = ?1
             GROUP BY account_id",
        )?
        .query_map((category_id,), |row| {
            Ok((row.get::<_, AccountId>(0)?, row.get::<_, Amount>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    for (account_id, total) in totals {
        let delta = balance_effect(total, new_type) - balance_effect(total, old_type);
        apply_balance_delta(account_id, delta, connection)?;
    }

    Ok(())
}

/// Replace the name, type and colour of one of the user's categories.
///
/// Changing the type re-signs the balance effect of the category's transactions.
/// Should be called within an SQL transaction.
///
/// # Errors
/// Returns a:
/// - [Error::NotFound] if the category is not visible to the user,
/// - [Error::SharedCategoryReadOnly] if the category is shared,
/// - the same validation errors as [create_category].
pub fn update_category(
    id: CategoryId,
    user_id: UserID,
    update: &NewCategory,
    connection: &Connection,
) -> Result<Category, Error> {
    let existing = get_own_category(id, user_id, connection)?;
    let name = validate_name(&update.name)?;
    let color = validate_color(update.color.as_deref())?;

    let category = connection
        .query_row(
            "UPDATE category SET name = ?1, type = ?2, color = ?3
             WHERE id = ?4 AND user_id = ?5
             RETURNING id, user_id, name, type, color",
            (&name, update.category_type, &color, id, user_id),
            map_category_row,
        )
        .map_err(|error| map_unique_name_error(error, &name))?;

    rebase_category_balances(
        id,
        Some(existing.category_type),
        Some(category.category_type),
        connection,
    )?;

    Ok(category)
}

/// Delete one of the user's categories.
///
/// Its transactions become uncategorized and account balances are adjusted to match.
/// Budgets for the category are deleted with it.
/// Should be called within an SQL transaction.
///
/// # Errors
/// Returns a:
/// - [Error::NotFound] if the category is not visible to the user,
/// - [Error::SharedCategoryReadOnly] if the category is shared.
pub fn delete_category(
    id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let existing = get_own_category(id, user_id, connection)?;

    rebase_category_balances(id, Some(existing.category_type), None, connection)?;

    connection.execute(
        "DELETE FROM category WHERE id = ?1 AND user_id = ?2",
        (id, user_id),
    )?;

    Ok(())
}
