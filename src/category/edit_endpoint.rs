//! Defines the endpoint for replacing a category.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    category::{Category, NewCategory, update_category},
    data_response::Data,
    database_id::CategoryId,
};

/// The state needed to edit a category.
#[derive(Debug, Clone)]
pub struct EditCategoryState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for replacing the name, type and colour of a category.
///
/// Shared categories cannot be edited and give 403 Forbidden.
pub async fn edit_category_endpoint(
    State(state): State<EditCategoryState>,
    Extension(user_id): Extension<UserID>,
    Path(category_id): Path<CategoryId>,
    Json(update): Json<NewCategory>,
) -> Result<Data<Category>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = connection.unchecked_transaction()?;
    let category = update_category(category_id, user_id, &update, &transaction)?;
    transaction.commit()?;

    Ok(Data::new(category))
}
