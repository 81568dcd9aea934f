//! Request instrumentation.
//!
//! Every request routed to a handler is timed and reported to
//! [`ServiceMetrics::record_request`](crate::metrics::ServiceMetrics::record_request)
//! under its matched route path.

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use rand::Rng;
use tokio::time::{sleep, Duration, Instant};
use tracing::debug;

use crate::state::SharedState;

/// Share of requests that get extra latency when latency simulation is on.
const LATENCY_PROBABILITY: f64 = 0.3;
/// Upper bound (exclusive) of the extra latency in milliseconds.
const MAX_EXTRA_LATENCY_MS: u64 = 100;

/// Records request count, latency and errors for the wrapped routes.
pub async fn track_requests(
    State(state): State<SharedState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let endpoint = match request.extensions().get::<MatchedPath>() {
        Some(path) => path.as_str().to_owned(),
        None => request.uri().path().to_owned(),
    };

    if state.config.latency_enabled() {
        if let Some(extra) = extra_latency() {
            sleep(extra).await;
        }
    }

    let response = next.run(request).await;

    let elapsed = start.elapsed();
    let status = response.status().as_u16();
    state
        .metrics
        .record_request(&method, &endpoint, status, elapsed);

    debug!(
        "{} {} -> {} in {:.3}ms",
        method,
        endpoint,
        status,
        elapsed.as_secs_f64() * 1000.0
    );
    response
}

fn extra_latency() -> Option<Duration> {
    let mut rng = rand::thread_rng();
    rng.gen_bool(LATENCY_PROBABILITY)
        .then(|| Duration::from_millis(rng.gen_range(0..MAX_EXTRA_LATENCY_MS)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extra_latency_is_bounded() {
        let mut delayed = 0;
        for _ in 0..10_000 {
            if let Some(extra) = extra_latency() {
                assert!(extra < Duration::from_millis(MAX_EXTRA_LATENCY_MS));
                delayed += 1;
            }
        }
        // roughly 30% of draws add latency
        assert!((2_000..4_000).contains(&delayed), "{delayed} delayed draws");
    }
}
