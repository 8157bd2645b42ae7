#![allow(missing_docs)]

pub(crate) mod http;

use rusqlite::Connection;

use crate::{
    auth::{PasswordHash, User, create_user},
    db::initialize,
};

pub(crate) use http::{TestApp, get_test_app, response_data};

/// A password that zxcvbn rates as strong.
pub(crate) const TEST_PASSWORD: &str = "correct horse battery staple 42!";

/// Open an in-memory database with all the tables created.
#[track_caller]
pub(crate) fn get_test_connection() -> Connection {
    let connection = Connection::open_in_memory().expect("could not open in-memory database");
    initialize(&connection).expect("could not initialize database");
    connection
}

/// Insert a user with [TEST_PASSWORD], hashed with a low bcrypt cost to keep tests fast.
#[track_caller]
pub(crate) fn must_create_test_user(connection: &Connection, username: &str) -> User {
    let password_hash =
        PasswordHash::from_raw_password(TEST_PASSWORD, &[], 4).expect("could not hash password");

    create_user(username, "", password_hash, connection).expect("could not create test user")
}
