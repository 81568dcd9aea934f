//! Application state management for the service.
//!
//! This module defines the shared application state that is passed
//! to HTTP handlers, the request middleware and the background tasks.

use prometheus::Registry;
use std::sync::Arc;

use crate::cart::CartStore;
use crate::config::Config;
use crate::metrics::ServiceMetrics;

/// Type alias for shared application state.
pub type SharedState = Arc<AppState>;

/// Global application state shared across requests and background tasks.
pub struct AppState {
    pub registry: Registry,
    pub metrics: ServiceMetrics,
    pub store: Arc<CartStore>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Builds a fresh state with an empty store and its own registry.
    pub fn new(config: Config) -> Result<SharedState, prometheus::Error> {
        let registry = Registry::new();
        let metrics = ServiceMetrics::new(&registry)?;

        Ok(Arc::new(Self {
            registry,
            metrics,
            store: Arc::new(CartStore::new()),
            config: Arc::new(config),
        }))
    }
}
