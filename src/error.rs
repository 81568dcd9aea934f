//! HTTP-facing error type.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::cart::CartError;

/// Errors returned by the cart handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid item: {0}")]
    InvalidItem(&'static str),

    #[error(transparent)]
    Cart(#[from] CartError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidJson(_) | Self::MissingField(_) | Self::InvalidItem(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Cart(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}
