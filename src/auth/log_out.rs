//! The endpoint for logging out.

use axum::{http::StatusCode, response::IntoResponse};
use axum_extra::extract::PrivateCookieJar;

use crate::{auth::invalidate_auth_cookie, data_response::Data};

/// Invalidate the auth cookie.
///
/// Does not require a valid cookie so that clients can always clear a stale one.
pub async fn post_log_out(jar: PrivateCookieJar) -> impl IntoResponse {
    (
        StatusCode::OK,
        invalidate_auth_cookie(jar),
        Data::new("logged out"),
    )
}
