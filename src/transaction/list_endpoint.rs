//! Endpoints for reading transactions.
use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, Query, State},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    auth::UserID,
    data_response::Data,
    database_id::{AccountId, CategoryId, TransactionId},
    date_range::{DateRange, parse_iso_date},
    transaction::{
        TransactionDetails, TransactionFilter, get_transaction_details, query_transactions,
    },
};

/// The state needed to read transactions.
#[derive(Debug, Clone)]
pub struct TransactionsState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query parameters for filtering the transaction list.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionQuery {
    pub limit: Option<u32>,
    pub account: Option<AccountId>,
    pub category: Option<CategoryId>,
    /// An ISO date, e.g. "2025-01-31". Inclusive.
    pub start_date: Option<String>,
    /// An ISO date, e.g. "2025-01-31". Inclusive.
    pub end_date: Option<String>,
}

impl TransactionQuery {
    /// Parse the dates and check that they form a valid range.
    ///
    /// # Errors
    /// Returns [Error::InvalidDate] or [Error::InvalidDateRange].
    pub fn into_filter(self) -> Result<TransactionFilter, Error> {
        let start_date = self.start_date.as_deref().map(parse_iso_date).transpose()?;
        let end_date = self.end_date.as_deref().map(parse_iso_date).transpose()?;

        if let (Some(start), Some(end)) = (start_date, end_date) {
            DateRange::new(start, end)?;
        }

        Ok(TransactionFilter {
            limit: self.limit,
            account_id: self.account,
            category_id: self.category,
            start_date,
            end_date,
        })
    }
}

/// List the user's transactions, newest first.
pub async fn get_transactions_endpoint(
    State(state): State<TransactionsState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<TransactionQuery>,
) -> Result<Data<Vec<TransactionDetails>>, Error> {
    let filter = query.into_filter()?;
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    query_transactions(user_id, &filter, &connection).map(Data::new)
}

/// Get one of the user's transactions.
pub async fn get_transaction_endpoint(
    State(state): State<TransactionsState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Data<TransactionDetails>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_transaction_details(transaction_id, user_id, &connection).map(Data::new)
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};
    use time::macros::date;

    use crate::{
        Error, endpoints,
        test_utils::{get_test_app, response_data},
    };

    use super::TransactionQuery;

    #[test]
    fn query_rejects_reversed_dates() {
        let query = TransactionQuery {
            start_date: Some("2025-02-01".to_owned()),
            end_date: Some("2025-01-01".to_owned()),
            ..Default::default()
        };

        assert_eq!(
            query.into_filter(),
            Err(Error::InvalidDateRange {
                start: date!(2025 - 02 - 01),
                end: date!(2025 - 01 - 01)
            })
        );
    }

    #[test]
    fn query_rejects_malformed_date() {
        let query = TransactionQuery {
            start_date: Some("yesterday".to_owned()),
            ..Default::default()
        };

        assert_eq!(
            query.into_filter(),
            Err(Error::InvalidDate("yesterday".to_owned()))
        );
    }

    #[tokio::test]
    async fn filters_by_date_and_limit() {
        let app = get_test_app().await;
        let account: Value =
            response_data(&app.post(endpoints::ACCOUNTS, &json!({ "name": "Wallet" })).await);
        for date in ["2025-01-10", "2025-02-10", "2025-03-10"] {
            app.post(
                endpoints::TRANSACTIONS,
                &json!({ "account": account["id"], "amount": "1.00", "date": date }),
            )
            .await;
        }

        let response = app
            .get(&format!(
                "{}?start_date=2025-02-01&end_date=2025-03-31&limit=1",
                endpoints::TRANSACTIONS
            ))
            .await;

        response.assert_status_ok();
        let transactions: Vec<Value> = response_data(&response);
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0]["date"], "2025-03-10");
    }
}
