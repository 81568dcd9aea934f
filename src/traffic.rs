//! Built-in traffic generator.
//!
//! Drives the service router in-process with a random mix of cart, health and
//! error requests so the metrics have something to show. Requests go through
//! the full middleware stack and are counted like external traffic.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use once_cell::sync::Lazy;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use rust_decimal::Decimal;
use serde_json::json;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tower::ServiceExt;
use tracing::{debug, info, warn};

use crate::cart::CartItem;

const USER_IDS: [&str; 5] = ["user1", "user2", "user3", "user4", "user5"];

static ITEMS: Lazy<Vec<CartItem>> = Lazy::new(|| {
    [
        ("item1", "Widget A", 1999, 1),
        ("item2", "Widget B", 2999, 2),
        ("item3", "Widget C", 3999, 1),
        ("item4", "Widget D", 4999, 3),
    ]
    .into_iter()
    .map(|(id, name, cents, quantity)| CartItem {
        id: id.to_string(),
        name: name.to_string(),
        price: Decimal::new(cents, 2),
        quantity,
    })
    .collect()
});

const GET_CART_PROBABILITY: f64 = 0.3;
const SIMULATE_ERROR_PROBABILITY: f64 = 0.1;
const HEALTH_PROBABILITY: f64 = 0.2;

/// Pause between rounds, in milliseconds.
const MIN_PAUSE_MS: u64 = 500;
const MAX_PAUSE_MS: u64 = 1500;

/// Requests sent during one round, with their response statuses.
#[derive(Debug, Default)]
pub struct Round {
    pub sent: Vec<(Method, String, StatusCode)>,
    /// Items the service accepted into a cart, keyed by user.
    pub added: Vec<(&'static str, CartItem)>,
}

/// Spawns the endless generator loop after `start_delay`.
pub fn spawn(app: Router, start_delay: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        sleep(start_delay).await;
        info!("Traffic simulation started");

        let mut rng = StdRng::from_entropy();
        loop {
            let round = run_round(&app, &mut rng).await;
            debug!("Simulated {} requests", round.sent.len());

            let pause = rng.gen_range(MIN_PAUSE_MS..MAX_PAUSE_MS);
            sleep(Duration::from_millis(pause)).await;
        }
    })
}

/// Performs one round: always adds an item, then optionally reads the cart,
/// hits the error endpoint and checks health.
pub async fn run_round<R: Rng + Send>(app: &Router, rng: &mut R) -> Round {
    let mut round = Round::default();

    let user_id = *USER_IDS.choose(rng).unwrap_or(&USER_IDS[0]);
    if let Some(item) = ITEMS.choose(rng) {
        let body = json!({ "user_id": user_id, "item": item });
        let request = Request::builder()
            .method(Method::POST)
            .uri("/cart/add")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()));
        if send(app, request, &mut round).await == Some(StatusCode::OK) {
            round.added.push((user_id, item.clone()));
        }
    }

    if rng.gen_bool(GET_CART_PROBABILITY) {
        let uri = format!("/cart/get?user_id={user_id}");
        send(app, get(&uri), &mut round).await;
    }

    if rng.gen_bool(SIMULATE_ERROR_PROBABILITY) {
        send(app, get("/simulate-error"), &mut round).await;
    }

    if rng.gen_bool(HEALTH_PROBABILITY) {
        send(app, get("/health"), &mut round).await;
    }

    round
}

fn get(uri: &str) -> Result<Request<Body>, axum::http::Error> {
    Request::builder().uri(uri).body(Body::empty())
}

async fn send(
    app: &Router,
    request: Result<Request<Body>, axum::http::Error>,
    round: &mut Round,
) -> Option<StatusCode> {
    let request = match request {
        Ok(request) => request,
        Err(e) => {
            warn!("Failed to build simulated request: {}", e);
            return None;
        }
    };

    let method = request.method().clone();
    let uri = request.uri().to_string();
    match app.clone().oneshot(request).await {
        Ok(response) => {
            let status = response.status();
            round.sent.push((method, uri, status));
            Some(status)
        }
        Err(e) => {
            warn!("Simulated request {} {} failed: {}", method, uri, e);
            None
        }
    }
}
