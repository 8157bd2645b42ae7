//! The endpoint for registering a new user.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::IntoResponse,
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    auth::{PasswordHash, ValidatedPassword, create_user},
    data_response::Data,
};

/// The state needed to register a user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The data for registering a new user.
#[derive(Debug, Deserialize)]
pub struct RegisterData {
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub password: String,
}

/// Create a new user, responds with the user and the status code 201.
///
/// The password must be hard to guess, and is rated against the username and email.
pub async fn register_user(
    State(state): State<RegistrationState>,
    Json(data): Json<RegisterData>,
) -> Result<impl IntoResponse, Error> {
    let validated_password =
        ValidatedPassword::new(&data.password, &[&data.username, &data.email])?;
    let password_hash = PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST)?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;
    let user = create_user(&data.username, &data.email, password_hash, &connection)?;

    tracing::info!("Registered user {} with ID {}", user.username, user.id);

    Ok((StatusCode::CREATED, Data::new(user)))
}
