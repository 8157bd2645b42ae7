//! A backend for tracking personal finances.
//!
//! Users keep a set of accounts whose balances are maintained automatically as
//! transactions are created, edited and deleted. Transactions can be categorised,
//! capped by budgets, generated from recurring schedules, imported from and
//! exported to CSV files, and summarised for a dashboard.
//!
//! This library provides a JSON REST API backed by a SQLite database.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use time::Date;
use tokio::signal;

mod account;
mod amount;
mod analytics;
mod app_state;
mod auth;
mod budget;
mod category;
mod csv_export;
mod csv_import;
mod data_response;
mod database_id;
mod date_range;
mod db;
mod endpoints;
mod logging;
mod patch;
mod recurring;
mod routing;
mod timezone;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use amount::Amount;
pub use app_state::AppState;
pub use auth::{
    PasswordHash, User, UserID, ValidatedPassword, get_user_by_username, update_password,
};
pub use category::{Category, CategoryType, NewCategory, create_category};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use recurring::{ProcessSummary, process_all_due_recurring_transactions};
pub use routing::build_router;
pub use timezone::{get_local_offset, local_today};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided an invalid combination of username and password.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The request did not carry a valid auth cookie.
    #[error("you must be logged in to access this resource")]
    NotAuthenticated,

    /// The auth cookie is missing from the cookie jar in the request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// There was an error creating the new auth cookie expiry date time.
    #[error("could not create the auth cookie expiry date-time")]
    InvalidExpiry,

    /// The auth token could not be read from the cookie, or it has expired.
    #[error("the auth token is invalid or has expired")]
    InvalidToken,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// The new password and its confirmation do not match.
    #[error("the new passwords do not match")]
    PasswordMismatch,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The username is already taken by another user.
    #[error("the username \"{0}\" is already taken")]
    DuplicateUsername(String),

    /// A required text field was empty.
    #[error("{0} cannot be empty")]
    EmptyField(&'static str),

    /// A string could not be parsed as an amount of money, or the amount
    /// does not fit into twelve digits with two decimal places.
    #[error("\"{0}\" is not a valid amount")]
    InvalidAmount(String),

    /// A string could not be parsed as a date.
    #[error("\"{0}\" is not a valid date")]
    InvalidDate(String),

    /// A currency code that is not three uppercase letters.
    #[error("\"{0}\" is not a valid currency code, expected three uppercase letters such as \"USD\"")]
    InvalidCurrency(String),

    /// A colour that is not a hex string such as "#aabbcc".
    #[error("\"{0}\" is not a valid colour, expected a hex colour such as \"#cccccc\"")]
    InvalidColor(String),

    /// An account type other than bank, cash or credit.
    #[error("\"{0}\" is not a valid account type")]
    InvalidAccountType(String),

    /// A category type other than income or expense.
    #[error("\"{0}\" is not a valid category type")]
    InvalidCategoryType(String),

    /// A frequency other than daily, weekly or monthly.
    #[error("\"{0}\" is not a valid frequency")]
    InvalidFrequency(String),

    /// The account ID did not refer to an account owned by the user.
    #[error("the account ID does not refer to a valid account")]
    InvalidAccount,

    /// The category ID did not refer to a category visible to the user.
    #[error("the category ID does not refer to a valid category")]
    InvalidCategory,

    /// An end date that comes before its start date.
    #[error("the end date {end} is before the start date {start}")]
    InvalidDateRange {
        /// The start of the range.
        start: Date,
        /// The end of the range.
        end: Date,
    },

    /// Shared categories can be used by everyone but edited by nobody.
    #[error("shared categories cannot be modified")]
    SharedCategoryReadOnly,

    /// The specified account name already exists for the user.
    #[error("the account \"{0}\" already exists")]
    DuplicateAccountName(String),

    /// The specified category name already exists for the user.
    #[error("the category \"{0}\" already exists")]
    DuplicateCategoryName(String),

    /// The multipart form could not be parsed.
    #[error("could not parse multipart form: {0}")]
    MultipartError(String),

    /// The multipart form did not contain a CSV file.
    #[error("no CSV file was uploaded")]
    MissingCsvFile,

    /// An import conflict policy other than skip or overwrite.
    #[error("\"{0}\" is not a valid conflict policy, expected \"skip\" or \"overwrite\"")]
    InvalidConflictPolicy(String),

    /// The CSV had issues that prevented it from being parsed at all.
    #[error("could not parse the CSV file: {0}")]
    InvalidCSV(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidCredentials
            | Error::NotAuthenticated
            | Error::CookieMissing
            | Error::InvalidExpiry
            | Error::InvalidToken => StatusCode::UNAUTHORIZED,
            Error::TooWeak(_)
            | Error::PasswordMismatch
            | Error::EmptyField(_)
            | Error::InvalidAmount(_)
            | Error::InvalidDate(_)
            | Error::InvalidCurrency(_)
            | Error::InvalidColor(_)
            | Error::InvalidAccountType(_)
            | Error::InvalidCategoryType(_)
            | Error::InvalidFrequency(_)
            | Error::InvalidAccount
            | Error::InvalidCategory
            | Error::InvalidDateRange { .. }
            | Error::MultipartError(_)
            | Error::MissingCsvFile
            | Error::InvalidConflictPolicy(_)
            | Error::InvalidCSV(_) => StatusCode::BAD_REQUEST,
            Error::SharedCategoryReadOnly => StatusCode::FORBIDDEN,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::DuplicateUsername(_)
            | Error::DuplicateAccountName(_)
            | Error::DuplicateCategoryName(_) => StatusCode::CONFLICT,
            Error::HashingError(_)
            | Error::SqlError(_)
            | Error::InvalidTimezoneError(_)
            | Error::DatabaseLockError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        let message = match self {
            Error::InvalidTimezoneError(timezone) => {
                tracing::error!("could not get the local timezone \"{timezone}\"");
                format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                )
            }
            // Internal errors are not intended to be shown to the client.
            error if status_code == StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!("An unexpected error occurred: {}", error);
                "An internal error occurred. Try again later or check the server logs".to_owned()
            }
            error => error.to_string(),
        };

        (status_code, Json(json!({ "error": message }))).into_response()
    }
}
