//! Defines the endpoint for editing a transaction.
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
    database_id::TransactionId,
    transaction::{TransactionDetails, TransactionUpdate, get_transaction_details, update_transaction},
};

/// The state needed to edit a transaction.
#[derive(Debug, Clone)]
pub struct EditTransactionState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for partially updating a transaction.
///
/// Send `"category": null` to remove the category. Account balances are moved to
/// match the new values in the same database transaction.
pub async fn edit_transaction_endpoint(
    State(state): State<EditTransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
    Json(update): Json<TransactionUpdate>,
) -> Result<Data<TransactionDetails>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let sql_transaction = connection.unchecked_transaction()?;
    update_transaction(transaction_id, user_id, &update, &sql_transaction)?;
    let details = get_transaction_details(transaction_id, user_id, &sql_transaction)?;
    sql_transaction.commit()?;

    Ok(Data::new(details))
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use crate::{
        endpoints::{self, format_endpoint},
        test_utils::{TestApp, get_test_app, response_data},
    };

    async fn get_balance(app: &TestApp, account_path: &str) -> String {
        let account: Value = response_data(&app.get(account_path).await);
        account["balance"].as_str().unwrap().to_owned()
    }

    #[tokio::test]
    async fn balance_follows_create_update_delete() {
        let app = get_test_app().await;
        let account: Value = response_data(
            &app.post(
                endpoints::ACCOUNTS,
                &json!({ "name": "Wallet", "balance": "100.00" }),
            )
            .await,
        );
        let account_path = format_endpoint(endpoints::ACCOUNT, account["id"].as_i64().unwrap());
        let category: Value = response_data(
            &app.post(
                endpoints::CATEGORIES,
                &json!({ "name": "Food", "type": "expense" }),
            )
            .await,
        );

        let transaction: Value = response_data(
            &app.post(
                endpoints::TRANSACTIONS,
                &json!({
                    "account": account["id"],
                    "category": category["id"],
                    "amount": "25.00"
                }),
            )
            .await,
        );
        assert_eq!(get_balance(&app, &account_path).await, "75.00");

        let transaction_path =
            format_endpoint(endpoints::TRANSACTION, transaction["id"].as_i64().unwrap());
        let response = app
            .patch(&transaction_path, &json!({ "amount": "10.00" }))
            .await;
        response.assert_status_ok();
        assert_eq!(get_balance(&app, &account_path).await, "90.00");

        app.delete(&transaction_path).await;
        assert_eq!(get_balance(&app, &account_path).await, "100.00");
    }

    #[tokio::test]
    async fn null_category_removes_category() {
        let app = get_test_app().await;
        let account: Value =
            response_data(&app.post(endpoints::ACCOUNTS, &json!({ "name": "Wallet" })).await);
        let category: Value = response_data(
            &app.post(
                endpoints::CATEGORIES,
                &json!({ "name": "Food", "type": "expense" }),
            )
            .await,
        );
        let transaction: Value = response_data(
            &app.post(
                endpoints::TRANSACTIONS,
                &json!({
                    "account": account["id"],
                    "category": category["id"],
                    "amount": "5.00"
                }),
            )
            .await,
        );

        let response = app
            .patch(
                &format_endpoint(endpoints::TRANSACTION, transaction["id"].as_i64().unwrap()),
                &json!({ "category": null }),
            )
            .await;

        response.assert_status_ok();
        let transaction: Value = response_data(&response);
        assert_eq!(transaction["category"], Value::Null);
        assert_eq!(transaction["category_name"], "Uncategorized");
    }
}
