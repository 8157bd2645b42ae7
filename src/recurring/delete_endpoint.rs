//! Defines the endpoint for deleting a recurring transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
};
use rusqlite::Connection;

use crate::{
    AppState, Error, auth::UserID, database_id::RecurringTransactionId,
    recurring::delete_recurring_transaction,
};

/// The state needed to delete a recurring transaction.
#[derive(Debug, Clone)]
pub struct DeleteRecurringTransactionState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteRecurringTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting a recurring transaction, responds with 204.
///
/// Transactions already created from the schedule are kept.
pub async fn delete_recurring_transaction_endpoint(
    State(state): State<DeleteRecurringTransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(recurring_id): Path<RecurringTransactionId>,
) -> Result<StatusCode, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    delete_recurring_transaction(recurring_id, user_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{
        endpoints::{self, format_endpoint},
        test_utils::{get_test_app, response_data},
    };

    #[tokio::test]
    async fn keeps_created_transactions() {
        let app = get_test_app().await;
        let account: Value =
            response_data(&app.post(endpoints::ACCOUNTS, &json!({ "name": "Wallet" })).await);
        let recurring: Value = response_data(
            &app.post(
                endpoints::RECURRING_TRANSACTIONS,
                &json!({
                    "account": account["id"],
                    "amount": "1.00",
                    "frequency": "daily",
                    "start_date": "2025-01-01",
                    "end_date": "2025-01-02"
                }),
            )
            .await,
        );
        let path = format_endpoint(
            endpoints::RECURRING_TRANSACTION,
            recurring["id"].as_i64().unwrap(),
        );

        app.delete(&path).await.assert_status(StatusCode::NO_CONTENT);

        app.get(&path).await.assert_status_not_found();
        let transactions: Vec<Value> = response_data(&app.get(endpoints::TRANSACTIONS).await);
        assert_eq!(transactions.len(), 2);
    }

    #[tokio::test]
    async fn missing_recurring_transaction_is_not_found() {
        let app = get_test_app().await;

        app.delete(&format_endpoint(endpoints::RECURRING_TRANSACTION, 7))
            .await
            .assert_status_not_found();
    }
}
