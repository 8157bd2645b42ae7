//! Endpoints for reading accounts.
use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    account::{Account, get_account, get_accounts},
    auth::UserID,
    data_response::Data,
    database_id::AccountId,
};

/// The state needed to read accounts.
#[derive(Debug, Clone)]
pub struct AccountsState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AccountsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// List the user's accounts, most recently updated first.
pub async fn get_accounts_endpoint(
    State(state): State<AccountsState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Data<Vec<Account>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_accounts(user_id, &connection).map(Data::new)
}

/// Get one of the user's accounts.
pub async fn get_account_endpoint(
    State(state): State<AccountsState>,
    Extension(user_id): Extension<UserID>,
    Path(account_id): Path<AccountId>,
) -> Result<Data<Account>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_account(account_id, user_id, &connection).map(Data::new)
}
