//! Endpoints for the logged in user's profile and password.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    auth::{PasswordHash, User, UserID, ValidatedPassword, get_user_by_id, update_password, user},
    data_response::Data,
};

/// The state needed to view and edit a user's profile.
#[derive(Debug, Clone)]
pub struct ProfileState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ProfileState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Get the logged in user.
pub async fn get_profile(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Data<User>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_user_by_id(user_id, &connection).map(Data::new)
}

/// Changes to a user's profile, missing fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
}

/// Change the logged in user's username and/or email.
pub async fn update_profile_endpoint(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserID>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Data<User>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    user::update_profile(
        user_id,
        update.username.as_deref(),
        update.email.as_deref(),
        &connection,
    )
    .map(Data::new)
}

/// The data for changing a password.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordData {
    pub old_password: String,
    pub new_password: String,
    pub new_password_confirm: String,
}

/// Change the logged in user's password.
///
/// # Errors
///
/// Returns a:
/// - [Error::InvalidCredentials] if the old password is wrong,
/// - [Error::PasswordMismatch] if the new password and its confirmation differ,
/// - [Error::TooWeak] if the new password is easy to guess.
pub async fn change_password_endpoint(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserID>,
    Json(data): Json<ChangePasswordData>,
) -> Result<Data<&'static str>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;
    let user = get_user_by_id(user_id, &connection)?;

    if !user.password_hash.verify(&data.old_password)? {
        return Err(Error::InvalidCredentials);
    }

    if data.new_password != data.new_password_confirm {
        return Err(Error::PasswordMismatch);
    }

    let validated_password =
        ValidatedPassword::new(&data.new_password, &[&user.username, &user.email])?;
    let password_hash = PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST)?;
    update_password(user_id, &password_hash, &connection)?;

    tracing::info!("User {user_id} changed their password");

    Ok(Data::new("password changed"))
}
