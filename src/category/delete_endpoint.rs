//! Defines the endpoint for deleting a category.
use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
};
use rusqlite::Connection;

use crate::{
    AppState, Error, auth::UserID, category::delete_category, database_id::CategoryId,
};

/// The state needed to delete a category.
#[derive(Debug, Clone)]
pub struct DeleteCategoryState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting a category, responds with 204 No Content.
///
/// The category's transactions are kept but become uncategorized.
pub async fn delete_category_endpoint(
    State(state): State<DeleteCategoryState>,
    Extension(user_id): Extension<UserID>,
    Path(category_id): Path<CategoryId>,
) -> Result<StatusCode, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = connection.unchecked_transaction()?;
    delete_category(category_id, user_id, &transaction)?;
    transaction.commit()?;

    tracing::info!("User {user_id} deleted category {category_id}");

    Ok(StatusCode::NO_CONTENT)
}
