//! The envelope for successful JSON responses.

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Wraps a response payload as `{"data": ...}`.
#[derive(Debug, Serialize)]
pub struct Data<T> {
    pub data: T,
}

impl<T> Data<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

impl<T: Serialize> IntoResponse for Data<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
