//! Endpoints for reading recurring transactions.
use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    data_response::Data,
    database_id::RecurringTransactionId,
    recurring::{RecurringTransaction, get_recurring_transaction, get_recurring_transactions},
};

/// The state needed to read recurring transactions.
#[derive(Debug, Clone)]
pub struct RecurringTransactionsState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RecurringTransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// List the user's recurring transactions, soonest due first.
pub async fn get_recurring_transactions_endpoint(
    State(state): State<RecurringTransactionsState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Data<Vec<RecurringTransaction>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_recurring_transactions(user_id, &connection).map(Data::new)
}

/// Get one of the user's recurring transactions.
pub async fn get_recurring_transaction_endpoint(
    State(state): State<RecurringTransactionsState>,
    Extension(user_id): Extension<UserID>,
    Path(recurring_id): Path<RecurringTransactionId>,
) -> Result<Data<RecurringTransaction>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_recurring_transaction(recurring_id, user_id, &connection).map(Data::new)
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use crate::{
        endpoints::{self, format_endpoint},
        test_utils::{get_test_app, response_data},
    };

    #[tokio::test]
    async fn lists_soonest_due_first() {
        let app = get_test_app().await;
        let account: Value =
            response_data(&app.post(endpoints::ACCOUNTS, &json!({ "name": "Wallet" })).await);
        for start_date in ["2999-06-01", "2999-01-01"] {
            app.post(
                endpoints::RECURRING_TRANSACTIONS,
                &json!({
                    "account": account["id"],
                    "amount": "1.00",
                    "frequency": "weekly",
                    "start_date": start_date
                }),
            )
            .await;
        }

        let response = app.get(endpoints::RECURRING_TRANSACTIONS).await;

        response.assert_status_ok();
        let recurring: Vec<Value> = response_data(&response);
        let next_dates: Vec<&str> = recurring
            .iter()
            .map(|recurring| recurring["next_date"].as_str().unwrap())
            .collect();
        assert_eq!(next_dates, vec!["2999-01-01", "2999-06-01"]);
    }

    #[tokio::test]
    async fn missing_recurring_transaction_is_not_found() {
        let app = get_test_app().await;

        app.get(&format_endpoint(endpoints::RECURRING_TRANSACTION, 42))
            .await
            .assert_status_not_found();
    }
}
