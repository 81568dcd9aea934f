//! In-memory shopping cart service instrumented with Prometheus metrics.
//!
//! The [`cart::CartStore`] keeps every user's cart; [`middleware`] records a
//! counter, a latency histogram and an error counter for each request, and the
//! [`observer::CartObserver`] periodically publishes cart totals as gauges.

pub mod app;
pub mod cart;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod observer;
pub mod state;
pub mod traffic;

pub use cart::{Cart, CartError, CartItem, CartStore, CartTotals};
pub use config::Config;
pub use state::{AppState, SharedState};
