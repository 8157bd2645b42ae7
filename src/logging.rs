//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{StatusCode, header::CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::endpoints;

/// Bodies longer than this many bytes are truncated at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// JSON fields whose values are never written to the logs.
const REDACTED_FIELDS: [&str; 4] = [
    "password",
    "old_password",
    "new_password",
    "new_password_confirm",
];

const REDACTED: &str = "********";

/// Logged in place of request bodies that might hold a password but could not be redacted.
const UNREDACTABLE_BODY: &str = "<body hidden: could not redact passwords>";

/// Routes whose request bodies carry passwords.
const PASSWORD_ROUTES: [&str; 3] = [
    endpoints::REGISTER,
    endpoints::LOG_IN,
    endpoints::CHANGE_PASSWORD,
];

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is truncated
/// and the full body is logged at the `debug` level. Passwords in JSON
/// request bodies are redacted, and request bodies that cannot be redacted are
/// hidden when they are meant to be JSON or are sent to a password route.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read request body: {error}");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let content_type = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());
    let body_text = request_body_for_log(
        &body_bytes,
        must_redact_body(parts.uri.path(), content_type),
    );
    log_body(
        &format!("Received request: {} {}", parts.method, parts.uri),
        &body_text,
    );

    let request = Request::from_parts(parts, Body::from(body_bytes));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_bytes: Bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    log_body(
        &format!("Sending response: {}", parts.status),
        &String::from_utf8_lossy(&body_bytes),
    );

    Response::from_parts(parts, Body::from(body_bytes))
}

/// Whether a request body has to be redacted before it can be logged.
fn must_redact_body(path: &str, content_type: Option<&str>) -> bool {
    PASSWORD_ROUTES.contains(&path)
        || content_type.is_some_and(|value| value.starts_with("application/json"))
}

/// The text to log for a request body.
///
/// JSON bodies have their password fields redacted. Other bodies are logged as
/// lossy UTF-8 text, unless `must_redact` is set, in which case a placeholder
/// is logged instead.
fn request_body_for_log(body: &[u8], must_redact: bool) -> String {
    if body.is_empty() {
        return String::new();
    }

    match redact_passwords(body) {
        Some(redacted) => redacted,
        None if must_redact => UNREDACTABLE_BODY.to_owned(),
        None => String::from_utf8_lossy(body).into_owned(),
    }
}

/// Replace the values of password fields in a JSON body.
///
/// Returns `None` if the body is not valid JSON.
fn redact_passwords(body: &[u8]) -> Option<String> {
    let mut json = serde_json::from_slice::<Value>(body).ok()?;

    if let Value::Object(fields) = &mut json {
        for field in REDACTED_FIELDS {
            if let Some(value) = fields.get_mut(field) {
                *value = Value::String(REDACTED.to_owned());
            }
        }
    }

    Some(json.to_string())
}

/// The longest prefix of `text` that is at most `limit` bytes and ends on a character boundary.
fn truncate(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }

    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }

    &text[..end]
}

fn log_body(message: &str, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "{message}\nbody: {}...",
            truncate(body, LOG_BODY_LENGTH_LIMIT)
        );
        tracing::debug!("Full body: {body:?}");
    } else {
        tracing::info!("{message}\nbody: {body:?}");
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use crate::endpoints;

    use super::{
        UNREDACTABLE_BODY, must_redact_body, redact_passwords, request_body_for_log, truncate,
    };

    #[test]
    fn redacts_all_password_fields() {
        let body = json!({
            "username": "alice",
            "password": "hunter2",
            "old_password": "a",
            "new_password": "b",
            "new_password_confirm": "b"
        })
        .to_string();

        let redacted: Value =
            serde_json::from_str(&redact_passwords(body.as_bytes()).unwrap()).unwrap();

        assert_eq!(
            redacted,
            json!({
                "username": "alice",
                "password": "********",
                "old_password": "********",
                "new_password": "********",
                "new_password_confirm": "********"
            })
        );
    }

    #[test]
    fn invalid_json_cannot_be_redacted() {
        assert_eq!(redact_passwords(b"password=hunter2"), None);
    }

    #[test]
    fn hides_malformed_bodies_that_must_be_redacted() {
        let body = br#"{"username":"alice","password":"hunter2""#;

        let logged = request_body_for_log(body, true);

        assert_eq!(logged, UNREDACTABLE_BODY);
        assert!(!logged.contains("hunter2"));
    }

    #[test]
    fn password_routes_are_redacted_whatever_the_content_type() {
        assert!(must_redact_body(endpoints::LOG_IN, Some("text/plain")));
        assert!(must_redact_body(endpoints::REGISTER, None));
        assert!(must_redact_body(endpoints::CHANGE_PASSWORD, None));
        assert!(must_redact_body(endpoints::ACCOUNTS, Some("application/json")));
        assert!(!must_redact_body(
            endpoints::IMPORT_TRANSACTIONS,
            Some("multipart/form-data; boundary=x")
        ));
    }

    #[test]
    fn logs_other_bodies_as_text() {
        assert_eq!(
            request_body_for_log(b"date,amount\n2025-01-01,1.00", false),
            "date,amount\n2025-01-01,1.00"
        );
        assert_eq!(
            request_body_for_log(br#"{"password":"hunter2"}"#, false),
            r#"{"password":"********"}"#
        );
        assert_eq!(request_body_for_log(b"", true), "");
    }

    #[test]
    fn truncates_on_character_boundary() {
        assert_eq!(truncate("héllo", 2), "h");
        assert_eq!(truncate("hello", 10), "hello");
    }
}
