//! Exporting transactions as a CSV file that can be imported again.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::IntoResponse,
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    transaction::{TransactionDetails, TransactionFilter, query_transactions},
};

const HEADER: [&str; 6] = ["date", "account", "category", "category_type", "amount", "notes"];

/// Write `transactions` as CSV text with a header row.
///
/// Uncategorized transactions leave the category columns empty.
pub fn write_transactions_csv(transactions: &[TransactionDetails]) -> Result<String, Error> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    let to_error = |error: csv::Error| Error::InvalidCSV(error.to_string());

    writer.write_record(HEADER).map_err(to_error)?;

    for details in transactions {
        let transaction = &details.transaction;
        let (category, category_type) = match details.category_type {
            Some(category_type) => (details.category_name.as_str(), category_type.as_str()),
            None => ("", ""),
        };

        writer
            .write_record([
                transaction.date.to_string().as_str(),
                details.account_name.as_str(),
                category,
                category_type,
                transaction.amount.to_string().as_str(),
                transaction.notes.as_str(),
            ])
            .map_err(to_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|error| Error::InvalidCSV(error.to_string()))?;

    String::from_utf8(bytes).map_err(|error| Error::InvalidCSV(error.to_string()))
}

/// The state needed for exporting transactions.
#[derive(Debug, Clone)]
pub struct ExportState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ExportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Route handler that downloads all of the user's transactions as a CSV file,
/// newest first.
pub async fn export_transactions_endpoint(
    State(state): State<ExportState>,
    Extension(user_id): Extension<UserID>,
) -> Result<impl IntoResponse, Error> {
    let transactions = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        query_transactions(user_id, &TransactionFilter::default(), &connection)?
    };

    let csv_text = write_transactions_csv(&transactions)?;

    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                CONTENT_DISPOSITION,
                "attachment; filename=\"transactions.csv\"",
            ),
        ],
        csv_text,
    ))
}
