//! Prometheus metrics definitions for the cart service.
//!
//! Request metrics are recorded by the request middleware once per completed
//! request; the two cart gauges are set by the background cart observer.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::time::Duration;

/// Latency buckets in seconds, 1ms up to 10s.
pub const LATENCY_BUCKETS: [f64; 12] = [
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Buffer capacity for metrics encoding.
const BUFFER_CAP: usize = 16 * 1024;

/// Classification of failed requests for the error counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Client,
    Server,
}

impl ErrorClass {
    /// Classifies a status code; `None` for anything below 400.
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            0..=399 => None,
            400..=499 => Some(Self::Client),
            _ => Some(Self::Server),
        }
    }

    /// Label value for the `error_type` label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "client_error",
            Self::Server => "server_error",
        }
    }
}

/// Collection of Prometheus metrics for request handling and cart state.
#[derive(Clone)]
pub struct ServiceMetrics {
    pub requests_total: IntCounterVec,
    pub request_duration: HistogramVec,
    pub errors_total: IntCounterVec,

    // Gauges derived from cart state
    pub cart_items: IntGauge,
    pub active_users: IntGauge,
}

impl ServiceMetrics {
    /// Creates and registers all metrics with the registry.
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let request_labels = &["method", "endpoint", "status_code"];

        let requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total number of HTTP requests"),
            request_labels,
        )?;
        let request_duration = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request latency in seconds",
            )
            .buckets(LATENCY_BUCKETS.to_vec()),
            request_labels,
        )?;
        let errors_total = IntCounterVec::new(
            Opts::new(
                "http_requests_errors_total",
                "Total number of HTTP error requests",
            ),
            &["error_type", "endpoint", "status_code"],
        )?;

        let cart_items = IntGauge::new("cart_items_total", "Total number of items in user carts")?;
        let active_users = IntGauge::new(
            "active_users_total",
            "Total number of active users with carts",
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(request_duration.clone()))?;
        registry.register(Box::new(errors_total.clone()))?;
        registry.register(Box::new(cart_items.clone()))?;
        registry.register(Box::new(active_users.clone()))?;

        Ok(Self {
            requests_total,
            request_duration,
            errors_total,
            cart_items,
            active_users,
        })
    }

    /// Records one completed request: the request counter, the latency
    /// histogram and, for error statuses, the error counter.
    pub fn record_request(&self, method: &str, endpoint: &str, status: u16, elapsed: Duration) {
        let code = status.to_string();
        let labels = [method, endpoint, code.as_str()];

        self.requests_total.with_label_values(&labels).inc();
        self.request_duration
            .with_label_values(&labels)
            .observe(elapsed.as_secs_f64());

        if let Some(class) = ErrorClass::from_status(status) {
            self.errors_total
                .with_label_values(&[class.as_str(), endpoint, code.as_str()])
                .inc();
        }
    }
}

/// Encodes everything in `registry` in the Prometheus text format.
pub fn encode(registry: &Registry) -> Result<String, prometheus::Error> {
    let families = registry.gather();
    let mut buffer = Vec::with_capacity(BUFFER_CAP);
    TextEncoder::new().encode(&families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
