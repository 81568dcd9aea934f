//! HTTP endpoint handlers for the service.
//!
//! This module provides handlers for all HTTP endpoints:
//! - `/cart/add`, `/cart/get`, `/cart/remove`: cart operations
//! - `/health`: Health check endpoint
//! - `/simulate-error`: Randomly failing endpoint for error metrics
//! - `/metrics`: Prometheus metrics endpoint

pub mod cart;
pub mod health;
pub mod metrics;
pub mod simulate;

// Re-export handlers
pub use cart::{add_to_cart_handler, get_cart_handler, remove_from_cart_handler};
pub use health::health_handler;
pub use metrics::metrics_handler;
pub use simulate::simulate_error_handler;
