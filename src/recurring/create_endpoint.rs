//! Defines the endpoint for creating a recurring transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::IntoResponse,
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    data_response::Data,
    recurring::{
        NewRecurringTransaction, create_recurring_transaction, get_recurring_transaction,
        materialize_due_occurrences,
    },
    timezone::local_today,
};

/// The state needed to create a recurring transaction.
#[derive(Debug, Clone)]
pub struct CreateRecurringTransactionState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateRecurringTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for creating a recurring transaction, responds with it and 201.
///
/// Occurrences between the start date and today are created straight away, so
/// a schedule that started in the past is caught up before the response, up to
/// [MAX_OCCURRENCES_PER_RUN](crate::recurring::process::MAX_OCCURRENCES_PER_RUN) of them.
///
/// The recurring transaction is saved before catching up. If catching up fails
/// the error is logged and the response is still 201, with a next date showing
/// how far it got. The rest are created by the process endpoint.
pub async fn create_recurring_transaction_endpoint(
    State(state): State<CreateRecurringTransactionState>,
    Extension(user_id): Extension<UserID>,
    Json(new_recurring): Json<NewRecurringTransaction>,
) -> Result<impl IntoResponse, Error> {
    let today = local_today(&state.local_timezone)?;
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let recurring = create_recurring_transaction(user_id, &new_recurring, &connection)?;
    let id = recurring.id;
    if let Err(error) = materialize_due_occurrences(recurring, today, &connection) {
        tracing::error!("Could not catch up new recurring transaction {id}: {error}");
    }
    let recurring = get_recurring_transaction(id, user_id, &connection)?;

    Ok((StatusCode::CREATED, Data::new(recurring)))
}
