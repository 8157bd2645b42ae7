//! Code for creating the user table and fetching users from the database.

use std::fmt::Display;

use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, auth::PasswordHash};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl rusqlite::ToSql for UserID {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        self.0.to_sql()
    }
}

/// A user of the application.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The unique name the user logs in with.
    pub username: String,
    /// The user's email address, may be empty.
    pub email: String,
    /// The user's password hash.
    #[serde(skip)]
    pub password_hash: PasswordHash,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL DEFAULT '',
                password TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_password_hash: String = row.get(3)?;

    Ok(User {
        id: UserID::new(row.get(0)?),
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
    })
}

/// Trim `username` and check that something is left.
///
/// # Errors
/// Returns [Error::EmptyField] if the username is blank.
pub fn normalize_username(username: &str) -> Result<String, Error> {
    let username = username.trim();

    if username.is_empty() {
        return Err(Error::EmptyField("username"));
    }

    Ok(username.to_owned())
}

fn map_unique_username_error(error: rusqlite::Error, username: &str) -> Error {
    match error {
        rusqlite::Error::SqliteFailure(sql_error, Some(_))
            if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            Error::DuplicateUsername(username.to_owned())
        }
        error => error.into(),
    }
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns a:
/// - [Error::EmptyField] if the username is blank,
/// - [Error::DuplicateUsername] if the username is taken,
/// - [Error::SqlError] if an SQL related error occurred.
pub fn create_user(
    username: &str,
    email: &str,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<User, Error> {
    let username = normalize_username(username)?;
    let email = email.trim();

    connection
        .query_row(
            "INSERT INTO user (username, email, password) VALUES (?1, ?2, ?3)
             RETURNING id, username, email, password",
            (&username, email, password_hash.as_ref()),
            map_user_row,
        )
        .map_err(|error| map_unique_username_error(error, &username))
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .query_row(
            "SELECT id, username, email, password FROM user WHERE id = ?1",
            (user_id,),
            map_user_row,
        )
        .map_err(|error| error.into())
}

/// Get the user from the database whose username is `username`.
///
/// # Errors
///
/// Returns [Error::NotFound] if nobody is registered with that username.
pub fn get_user_by_username(username: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .query_row(
            "SELECT id, username, email, password FROM user WHERE username = ?1",
            (username.trim(),),
            map_user_row,
        )
        .map_err(|error| error.into())
}

/// Change the username and/or email of a user, leaving `None` fields unchanged.
///
/// # Errors
///
/// Returns a:
/// - [Error::NotFound] if `user_id` does not refer to a user,
/// - [Error::EmptyField] if the new username is blank,
/// - [Error::DuplicateUsername] if the new username is taken.
pub fn update_profile(
    user_id: UserID,
    username: Option<&str>,
    email: Option<&str>,
    connection: &Connection,
) -> Result<User, Error> {
    let username = username.map(normalize_username).transpose()?;
    let email = email.map(str::trim);

    connection
        .query_row(
            "UPDATE user SET username = COALESCE(?1, username), email = COALESCE(?2, email)
             WHERE id = ?3
             RETURNING id, username, email, password",
            (&username, email, user_id),
            map_user_row,
        )
        .optional()
        .map_err(|error| map_unique_username_error(error, username.as_deref().unwrap_or("")))?
        .ok_or(Error::NotFound)
}

/// Replace the password hash of a user.
///
/// # Errors
///
/// Returns [Error::NotFound] if `user_id` does not refer to a user.
pub fn update_password(
    user_id: UserID,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET password = ?1 WHERE id = ?2",
        (password_hash.as_ref(), user_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}
