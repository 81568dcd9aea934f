//! Endpoint that always fails, used to populate the error metrics.

use axum::http::StatusCode;
use rand::seq::SliceRandom;
use tracing::{debug, instrument};

/// Status codes `/simulate-error` picks from.
pub const SIMULATED_STATUSES: [StatusCode; 7] = [
    StatusCode::BAD_REQUEST,
    StatusCode::UNAUTHORIZED,
    StatusCode::FORBIDDEN,
    StatusCode::NOT_FOUND,
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
];

/// Handler for the /simulate-error endpoint.
#[instrument]
pub async fn simulate_error_handler() -> (StatusCode, String) {
    let status = *SIMULATED_STATUSES
        .choose(&mut rand::thread_rng())
        .unwrap_or(&StatusCode::INTERNAL_SERVER_ERROR);

    debug!("Simulating error with status {}", status.as_u16());
    (
        status,
        format!("Simulated error with status {}", status.as_u16()),
    )
}
