//! Defines the endpoint for editing a recurring transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    data_response::Data,
    database_id::RecurringTransactionId,
    recurring::{RecurringTransaction, RecurringTransactionUpdate, update_recurring_transaction},
};

/// The state needed to edit a recurring transaction.
#[derive(Debug, Clone)]
pub struct EditRecurringTransactionState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditRecurringTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for partially updating a recurring transaction.
///
/// Changes only affect occurrences created from now on.
pub async fn edit_recurring_transaction_endpoint(
    State(state): State<EditRecurringTransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(recurring_id): Path<RecurringTransactionId>,
    Json(update): Json<RecurringTransactionUpdate>,
) -> Result<Data<RecurringTransaction>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    update_recurring_transaction(recurring_id, user_id, &update, &connection).map(Data::new)
}
