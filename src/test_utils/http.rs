use std::sync::{Arc, Mutex};

use axum_extra::extract::cookie::Cookie;
use axum_test::{TestResponse, TestServer};
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::{
    AppState,
    auth::COOKIE_TOKEN,
    build_router, endpoints,
    test_utils::{TEST_PASSWORD, must_create_test_user},
};

/// A test server for the full router with a logged in user.
pub(crate) struct TestApp {
    pub server: TestServer,
    /// The auth cookie of the logged in user.
    pub cookie: Cookie<'static>,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl TestApp {
    /// Log in as another user, creating them first, and return their auth cookie.
    pub async fn log_in_as(&self, username: &str) -> Cookie<'static> {
        {
            let connection = self.db_connection.lock().unwrap();
            must_create_test_user(&connection, username);
        }

        log_in(&self.server, username).await
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.server.get(path).add_cookie(self.cookie.clone()).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> TestResponse {
        self.server
            .post(path)
            .add_cookie(self.cookie.clone())
            .json(body)
            .await
    }

    pub async fn put(&self, path: &str, body: &Value) -> TestResponse {
        self.server
            .put(path)
            .add_cookie(self.cookie.clone())
            .json(body)
            .await
    }

    pub async fn patch(&self, path: &str, body: &Value) -> TestResponse {
        self.server
            .patch(path)
            .add_cookie(self.cookie.clone())
            .json(body)
            .await
    }

    pub async fn delete(&self, path: &str) -> TestResponse {
        self.server
            .delete(path)
            .add_cookie(self.cookie.clone())
            .await
    }
}

async fn log_in(server: &TestServer, username: &str) -> Cookie<'static> {
    let response = server
        .post(endpoints::LOG_IN)
        .json(&json!({ "username": username, "password": TEST_PASSWORD }))
        .await;
    response.assert_status_ok();

    response.cookie(COOKIE_TOKEN)
}

/// Start the app on an in-memory database and log in as "alice".
pub(crate) async fn get_test_app() -> TestApp {
    let state = AppState::new(
        Connection::open_in_memory().unwrap(),
        "test secret",
        "Etc/UTC",
    )
    .unwrap();
    let db_connection = state.db_connection.clone();
    {
        let connection = db_connection.lock().unwrap();
        must_create_test_user(&connection, "alice");
    }

    let server = TestServer::try_new(build_router(state)).expect("Could not create test server.");
    let cookie = log_in(&server, "alice").await;

    TestApp {
        server,
        cookie,
        db_connection,
    }
}

/// Read the `data` field of a JSON success response.
#[track_caller]
pub(crate) fn response_data<T: DeserializeOwned>(response: &TestResponse) -> T {
    let body: Value = response.json();

    serde_json::from_value(body["data"].clone()).expect("could not deserialize response data")
}
