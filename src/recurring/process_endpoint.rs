//! Defines the endpoint for processing the user's due recurring transactions.
use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    data_response::Data,
    recurring::{ProcessSummary, process_due_recurring_transactions},
    timezone::local_today,
};

/// The state needed to process recurring transactions.
#[derive(Debug, Clone)]
pub struct ProcessRecurringState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ProcessRecurringState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that creates transactions for every due occurrence of the
/// user's recurring transactions up to today.
pub async fn process_recurring_transactions_endpoint(
    State(state): State<ProcessRecurringState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Data<ProcessSummary>, Error> {
    let today = local_today(&state.local_timezone)?;
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let summary = process_due_recurring_transactions(user_id, today, &connection)?;
    tracing::info!(
        "Processed {} recurring transactions for user {user_id}, created {} transactions",
        summary.recurring_processed,
        summary.transactions_created
    );

    Ok(Data::new(summary))
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use crate::{
        endpoints,
        test_utils::{get_test_app, response_data},
    };

    #[tokio::test]
    async fn nothing_due_gives_empty_summary() {
        let app = get_test_app().await;

        let response = app
            .post(endpoints::PROCESS_RECURRING_TRANSACTIONS, &json!({}))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({
            "data": { "recurring_processed": 0, "transactions_created": 0 }
        }));
    }

    #[tokio::test]
    async fn creates_occurrences_that_became_due() {
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
                    "start_date": "2999-01-01"
                }),
            )
            .await,
        );
        // Move the schedule into the past so that two occurrences are due.
        {
            let connection = app.db_connection.lock().unwrap();
            connection
                .execute(
                    "UPDATE recurring_transaction
                     SET start_date = '2025-01-02', next_date = '2025-01-02', end_date = '2025-01-03'
                     WHERE id = ?1",
                    (recurring["id"].as_i64().unwrap(),),
                )
                .unwrap();
        }

        let response = app
            .post(endpoints::PROCESS_RECURRING_TRANSACTIONS, &json!({}))
            .await;

        response.assert_status_ok();
        let summary: Value = response_data(&response);
        assert_eq!(summary["recurring_processed"], 1);
        assert_eq!(summary["transactions_created"], 2);
    }
}
