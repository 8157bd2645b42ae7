//! Route handlers for the dashboard analytics.
use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    analytics::{CategorySpending, Summary, get_spending_by_category, get_summary},
    auth::UserID,
    budget::{BudgetDetails, get_budgets_overlapping},
    data_response::Data,
    date_range::MonthQuery,
    transaction::{TransactionDetails, TransactionFilter, query_transactions},
};

/// The number of transactions returned by the recent transactions endpoint by default.
pub const DEFAULT_RECENT_TRANSACTIONS_LIMIT: u32 = 5;

/// The state needed for the analytics endpoints.
#[derive(Debug, Clone)]
pub struct AnalyticsState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AnalyticsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The total balance and the income and expenses of a month.
pub async fn get_summary_endpoint(
    State(state): State<AnalyticsState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<MonthQuery>,
) -> Result<Data<Summary>, Error> {
    let month = query.resolve(&state.local_timezone)?;
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_summary(user_id, month, &connection).map(Data::new)
}

/// A month's expenses grouped by category, largest first.
pub async fn get_spending_by_category_endpoint(
    State(state): State<AnalyticsState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<MonthQuery>,
) -> Result<Data<Vec<CategorySpending>>, Error> {
    let month = query.resolve(&state.local_timezone)?;
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_spending_by_category(user_id, month, &connection).map(Data::new)
}

/// The progress of every budget whose dates overlap a month.
///
/// The amount spent covers each budget's own dates, not just the month.
pub async fn get_budget_progress_endpoint(
    State(state): State<AnalyticsState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<MonthQuery>,
) -> Result<Data<Vec<BudgetDetails>>, Error> {
    let month = query.resolve(&state.local_timezone)?;
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_budgets_overlapping(user_id, month, &connection).map(Data::new)
}

/// The query parameters for the recent transactions endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct RecentTransactionsQuery {
    pub limit: Option<u32>,
}

/// The user's most recent transactions.
pub async fn get_recent_transactions_endpoint(
    State(state): State<AnalyticsState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<RecentTransactionsQuery>,
) -> Result<Data<Vec<TransactionDetails>>, Error> {
    let filter = TransactionFilter {
        limit: Some(query.limit.unwrap_or(DEFAULT_RECENT_TRANSACTIONS_LIMIT)),
        ..Default::default()
    };
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    query_transactions(user_id, &filter, &connection).map(Data::new)
}
