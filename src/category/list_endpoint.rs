//! Endpoints for reading categories.
use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    category::{Category, get_categories, get_category, get_own_categories},
    data_response::Data,
    database_id::CategoryId,
};

/// The state needed to read categories.
#[derive(Debug, Clone)]
pub struct CategoriesState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoriesState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// List the categories the user can use: their own followed by the shared ones.
pub async fn get_categories_endpoint(
    State(state): State<CategoriesState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Data<Vec<Category>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_categories(user_id, &connection).map(Data::new)
}

/// List only the categories the user created.
pub async fn get_own_categories_endpoint(
    State(state): State<CategoriesState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Data<Vec<Category>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_own_categories(user_id, &connection).map(Data::new)
}

/// Get one category the user can use.
pub async fn get_category_endpoint(
    State(state): State<CategoriesState>,
    Extension(user_id): Extension<UserID>,
    Path(category_id): Path<CategoryId>,
) -> Result<Data<Category>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_category(category_id, user_id, &connection).map(Data::new)
}
