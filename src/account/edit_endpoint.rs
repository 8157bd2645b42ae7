//! Defines the endpoint for editing an account.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    account::{Account, AccountUpdate, update_account},
    auth::UserID,
    data_response::Data,
    database_id::AccountId,
};

/// The state needed to edit an account.
#[derive(Debug, Clone)]
pub struct EditAccountState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for partially updating an account.
///
/// Setting `balance` overwrites the running balance, e.g. to match a bank statement.
pub async fn edit_account_endpoint(
    State(state): State<EditAccountState>,
    Extension(user_id): Extension<UserID>,
    Path(account_id): Path<AccountId>,
    Json(update): Json<AccountUpdate>,
) -> Result<Data<Account>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    if update.balance.is_some() {
        tracing::info!("Balance of account {account_id} set directly by user {user_id}");
    }

    update_account(account_id, user_id, &update, &connection).map(Data::new)
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use crate::{
        endpoints::{self, format_endpoint},
        test_utils::{get_test_app, response_data},
    };

    #[tokio::test]
    async fn patch_changes_given_fields_only() {
        let app = get_test_app().await;
        let response = app
            .post(
                endpoints::ACCOUNTS,
                &json!({ "name": "Wallet", "balance": 10 }),
            )
            .await;
        let account: Value = response_data(&response);
        let path = format_endpoint(endpoints::ACCOUNT, account["id"].as_i64().unwrap());

        let response = app.patch(&path, &json!({ "name": "Purse" })).await;

        response.assert_status_ok();
        let account: Value = response_data(&response);
        assert_eq!(account["name"], "Purse");
        assert_eq!(account["balance"], "10.00");
    }

    #[tokio::test]
    async fn patch_unknown_account_is_not_found() {
        let app = get_test_app().await;

        let response = app
            .patch(
                &format_endpoint(endpoints::ACCOUNT, 999),
                &json!({ "name": "Purse" }),
            )
            .await;

        response.assert_status_not_found();
    }
}
