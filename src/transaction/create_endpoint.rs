//! Defines the endpoint for creating a transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::IntoResponse,
};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    Amount, AppState, Error,
    auth::UserID,
    data_response::Data,
    database_id::{AccountId, CategoryId},
    date_range::iso_date,
    timezone::local_today,
    transaction::{NewTransaction, create_transaction, get_transaction_details},
};

/// The state needed to create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for creating a transaction.
#[derive(Debug, Deserialize)]
pub struct TransactionData {
    pub account: AccountId,
    #[serde(default)]
    pub category: Option<CategoryId>,
    pub amount: Amount,
    /// Defaults to today in the server's timezone.
    #[serde(default, with = "iso_date::option")]
    pub date: Option<Date>,
    #[serde(default)]
    pub notes: String,
}

/// A route handler for creating a transaction, responds with the transaction and 201.
///
/// The account balance is updated in the same database transaction.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
    Json(data): Json<TransactionData>,
) -> Result<impl IntoResponse, Error> {
    let date = match data.date {
        Some(date) => date,
        None => local_today(&state.local_timezone)?,
    };
    let new_transaction = NewTransaction {
        account_id: data.account,
        category_id: data.category,
        amount: data.amount,
        date,
        notes: data.notes,
    };

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let sql_transaction = connection.unchecked_transaction()?;
    let transaction = create_transaction(user_id, &new_transaction, &sql_transaction)?;
    let details = get_transaction_details(transaction.id, user_id, &sql_transaction)?;
    sql_transaction.commit()?;

    Ok((StatusCode::CREATED, Data::new(details)))
}
