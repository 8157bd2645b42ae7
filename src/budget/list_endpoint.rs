//! Endpoints for reading budgets.
use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    budget::{BudgetDetails, get_budget, get_budgets},
    data_response::Data,
    database_id::BudgetId,
};

/// The state needed to read budgets.
#[derive(Debug, Clone)]
pub struct BudgetsState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for BudgetsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// List the user's budgets, latest start date first.
pub async fn get_budgets_endpoint(
    State(state): State<BudgetsState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Data<Vec<BudgetDetails>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_budgets(user_id, &connection).map(Data::new)
}

/// Get one of the user's budgets.
pub async fn get_budget_endpoint(
    State(state): State<BudgetsState>,
    Extension(user_id): Extension<UserID>,
    Path(budget_id): Path<BudgetId>,
) -> Result<Data<BudgetDetails>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_budget(budget_id, user_id, &connection).map(Data::new)
}
