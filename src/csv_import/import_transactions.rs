//! Importing transactions from an uploaded CSV file.

use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use axum::{
    Extension,
    extract::{FromRef, Multipart, Query, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    AppState, Error,
    account::get_or_create_account_by_name,
    auth::UserID,
    category::{NewCategory, create_category, find_category_by_name},
    csv_import::parse::{ImportRow, ParsedCsv, RowError, parse_import_csv},
    data_response::Data,
    database_id::CategoryId,
    timezone::local_today,
    transaction::{
        NewTransaction, TransactionUpdate, create_transaction, find_duplicate_transaction,
        update_transaction,
    },
};

/// What to do with a row that matches an existing transaction.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Leave the existing transaction alone.
    #[default]
    Skip,
    /// Replace the existing transaction's values with the row's.
    Overwrite,
}

impl FromStr for ConflictPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "skip" => Ok(ConflictPolicy::Skip),
            "overwrite" => Ok(ConflictPolicy::Overwrite),
            _ => Err(Error::InvalidConflictPolicy(s.to_owned())),
        }
    }
}

/// The counts of what happened to each row of an import.
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct ImportSummary {
    /// Rows saved as new transactions.
    pub created: usize,
    /// Rows that overwrote a duplicate transaction.
    pub updated: usize,
    /// Rows left out because they duplicate an existing transaction.
    pub skipped: usize,
    /// Rows that could not be imported, in file order.
    pub errors: Vec<RowError>,
}

enum RowOutcome {
    Created,
    Updated,
    Skipped,
}

/// Save the rows of a parsed CSV file for `user_id`.
///
/// Each row commits on its own, so a row that fails is recorded in the
/// summary's errors without undoing the rows before it. Accounts and
/// categories named by the rows are created when the user does not have them.
/// Rows without a date are dated `today`.
///
/// Must not be called inside another SQL transaction.
pub fn import_rows(
    user_id: UserID,
    parsed: ParsedCsv,
    policy: ConflictPolicy,
    today: Date,
    connection: &Connection,
) -> ImportSummary {
    let mut summary = ImportSummary {
        errors: parsed.errors,
        ..Default::default()
    };

    for row in parsed.rows {
        match import_row(user_id, &row, policy, today, connection) {
            Ok(RowOutcome::Created) => summary.created += 1,
            Ok(RowOutcome::Updated) => summary.updated += 1,
            Ok(RowOutcome::Skipped) => summary.skipped += 1,
            Err(error) => {
                tracing::debug!("Could not import row {}: {error}", row.row);
                summary.errors.push(RowError {
                    row: row.row,
                    error: error.to_string(),
                });
            }
        }
    }

    summary.errors.sort_by_key(|error| error.row);

    summary
}

fn import_row(
    user_id: UserID,
    row: &ImportRow,
    policy: ConflictPolicy,
    today: Date,
    connection: &Connection,
) -> Result<RowOutcome, Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    let account = get_or_create_account_by_name(&row.account, user_id, &sql_transaction)?;
    let duplicate =
        find_duplicate_transaction(user_id, account.id, row.amount, row.date, &sql_transaction)?;

    let outcome = match (duplicate, policy) {
        (Some(_), ConflictPolicy::Skip) => RowOutcome::Skipped,
        (Some(existing), ConflictPolicy::Overwrite) => {
            let category_id = resolve_category(row, user_id, &sql_transaction)?;
            update_transaction(
                existing.id,
                user_id,
                &TransactionUpdate {
                    account_id: Some(account.id),
                    category_id: Some(category_id),
                    amount: Some(row.amount),
                    date: row.date,
                    notes: Some(row.notes.clone()),
                },
                &sql_transaction,
            )?;
            RowOutcome::Updated
        }
        (None, _) => {
            let category_id = resolve_category(row, user_id, &sql_transaction)?;
            create_transaction(
                user_id,
                &NewTransaction {
                    account_id: account.id,
                    category_id,
                    amount: row.amount,
                    date: row.date.unwrap_or(today),
                    notes: row.notes.clone(),
                },
                &sql_transaction,
            )?;
            RowOutcome::Created
        }
    };

    sql_transaction.commit()?;

    Ok(outcome)
}

fn resolve_category(
    row: &ImportRow,
    user_id: UserID,
    connection: &Connection,
) -> Result<Option<CategoryId>, Error> {
    let Some(name) = &row.category else {
        return Ok(None);
    };

    if let Some(category) = find_category_by_name(name, user_id, connection)? {
        return Ok(Some(category.id));
    }

    tracing::debug!("Creating category \"{name}\" for user {user_id}");
    let category = create_category(
        Some(user_id),
        &NewCategory {
            name: name.clone(),
            category_type: row.category_type,
            color: None,
        },
        connection,
    )?;

    Ok(Some(category.id))
}

/// The state needed for importing transactions.
#[derive(Debug, Clone)]
pub struct ImportState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ImportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query parameters accepted by the import endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ImportQuery {
    pub on_conflict: Option<ConflictPolicy>,
}

/// Route handler for importing transactions from a CSV file.
///
/// Expects a multipart form with the CSV in a field named `file` (or any field
/// with a file name) and an optional `on_conflict` field of "skip" or
/// "overwrite". The form field takes precedence over the `on_conflict` query
/// parameter.
pub async fn import_transactions_endpoint(
    State(state): State<ImportState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<ImportQuery>,
    mut multipart: Multipart,
) -> Result<Data<ImportSummary>, Error> {
    let start_time = std::time::Instant::now();
    let mut csv_text = None;
    let mut policy = query.on_conflict.unwrap_or_default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| Error::MultipartError(error.body_text()))?
    {
        let is_file = field.name() == Some("file") || field.file_name().is_some();
        let is_policy = field.name() == Some("on_conflict");

        if !is_file && !is_policy {
            continue;
        }

        let text = field.text().await.map_err(|error| {
            tracing::error!("Could not read data from multipart form field: {error}");
            Error::MultipartError(error.body_text())
        })?;

        if is_policy {
            policy = text.parse()?;
        } else {
            csv_text = Some(text);
        }
    }

    let csv_text = csv_text.ok_or(Error::MissingCsvFile)?;
    let parsed = parse_import_csv(&csv_text)?;
    let today = local_today(&state.local_timezone)?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let summary = import_rows(user_id, parsed, policy, today, &connection);

    tracing::info!(
        "Imported CSV for user {user_id} in {}ms: {} created, {} updated, {} skipped, {} errors",
        start_time.elapsed().as_millis(),
        summary.created,
        summary.updated,
        summary.skipped,
        summary.errors.len()
    );

    Ok(Data::new(summary))
}
