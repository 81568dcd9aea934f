//! HTTP routing.

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use crate::handlers::{
    add_to_cart_handler, get_cart_handler, health_handler, metrics_handler,
    remove_from_cart_handler, simulate_error_handler,
};
use crate::middleware::track_requests;
use crate::state::SharedState;

/// Builds the service router. Every route except `/metrics` is instrumented.
pub fn router(state: SharedState) -> Router {
    let mut app = Router::new()
        .route("/cart/add", post(add_to_cart_handler))
        .route("/cart/get", get(get_cart_handler))
        .route("/cart/remove", delete(remove_from_cart_handler))
        .route("/simulate-error", get(simulate_error_handler));

    // Conditionally add health endpoint
    if state.config.health_enabled() {
        app = app.route("/health", get(health_handler));
    }

    app.route_layer(middleware::from_fn_with_state(
        state.clone(),
        track_requests,
    ))
    .route("/metrics", get(metrics_handler))
    .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::handlers::cart::StatusBody;
    use crate::metrics::encode;
    use crate::state::AppState;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_state() -> SharedState {
        AppState::new(Config {
            simulate_latency: Some(false),
            simulate_traffic: Some(false),
            ..Config::default()
        })
        .unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> Response {
        app.clone().oneshot(request).await.unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn delete_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("DELETE")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn add_body(user: &str, id: &str, quantity: u32) -> Value {
        json!({
            "user_id": user,
            "item": {"id": id, "name": format!("Widget {id}"), "price": 19.99, "quantity": quantity}
        })
    }

    #[tokio::test]
    async fn test_add_get_remove_flow() {
        let state = test_state();
        let app = router(state.clone());

        let res = send(&app, post_json("/cart/add", add_body("u1", "a", 2))).await;
        assert_eq!(res.status(), StatusCode::OK);
        let status: StatusBody = serde_json::from_str(&body_text(res).await).unwrap();
        assert_eq!(status.status, "success");

        send(&app, post_json("/cart/add", add_body("u1", "a", 3))).await;
        send(&app, post_json("/cart/add", add_body("u1", "b", 1))).await;

        let res = send(&app, get("/cart/get?user_id=u1")).await;
        assert_eq!(res.status(), StatusCode::OK);
        let cart: Value = serde_json::from_str(&body_text(res).await).unwrap();
        assert_eq!(cart["user_id"], "u1");
        assert_eq!(cart["items"][0]["id"], "a");
        assert_eq!(cart["items"][0]["quantity"], 5);
        assert_eq!(cart["items"][0]["price"], 19.99);

        let res = send(
            &app,
            delete_json("/cart/remove", json!({"user_id": "u1", "item_id": "a"})),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);

        let cart = state.store.get_cart("u1").unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].id, "b");
    }

    #[tokio::test]
    async fn test_error_responses() {
        let app = router(test_state());

        let res = send(&app, get("/cart/get?user_id=unknown")).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_text(res).await, "cart not found for user unknown");

        let res = send(&app, get("/cart/get")).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        send(&app, post_json("/cart/add", add_body("u1", "a", 1))).await;
        let res = send(
            &app,
            delete_json("/cart/remove", json!({"user_id": "u1", "item_id": "missing-id"})),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert!(body_text(res).await.contains("item missing-id not found"));

        let res = send(&app, post_json("/cart/add", add_body("", "a", 1))).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = send(&app, post_json("/cart/add", add_body("u1", "a", 0))).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let bad = Request::builder()
            .method("POST")
            .uri("/cart/add")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let res = send(&app, bad).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_requests_are_instrumented() {
        let state = test_state();
        let app = router(state.clone());

        send(&app, post_json("/cart/add", add_body("u1", "a", 1))).await;
        send(&app, get("/cart/get?user_id=nobody")).await;

        let metrics = &state.metrics;
        assert_eq!(
            metrics
                .requests_total
                .with_label_values(&["POST", "/cart/add", "200"])
                .get(),
            1
        );
        assert_eq!(
            metrics
                .request_duration
                .with_label_values(&["POST", "/cart/add", "200"])
                .get_sample_count(),
            1
        );
        assert_eq!(
            metrics
                .requests_total
                .with_label_values(&["GET", "/cart/get", "404"])
                .get(),
            1
        );
        assert_eq!(
            metrics
                .errors_total
                .with_label_values(&["client_error", "/cart/get", "404"])
                .get(),
            1
        );
    }

    #[tokio::test]
    async fn test_method_mismatch_is_counted_under_route() {
        let state = test_state();
        let app = router(state.clone());

        let res = send(&app, get("/cart/add")).await;
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);

        let metrics = &state.metrics;
        assert_eq!(
            metrics
                .requests_total
                .with_label_values(&["GET", "/cart/add", "405"])
                .get(),
            1
        );
        assert_eq!(
            metrics
                .errors_total
                .with_label_values(&["client_error", "/cart/add", "405"])
                .get(),
            1
        );

        // unknown paths match no route
        let res = send(&app, get("/no-such-route")).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let text = encode(&state.registry).unwrap();
        assert!(!text.contains("/no-such-route"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_latency_is_observed_and_bounded() {
        let state = AppState::new(Config {
            simulate_latency: Some(true),
            simulate_traffic: Some(false),
            ..Config::default()
        })
        .unwrap();
        let app = router(state.clone());
        let hist = state
            .metrics
            .request_duration
            .with_label_values(&["GET", "/health", "200"]);

        let mut previous = 0.0;
        for _ in 0..50 {
            let res = send(&app, get("/health")).await;
            assert_eq!(res.status(), StatusCode::OK);

            let sum = hist.get_sample_sum();
            assert!(sum - previous < 0.1, "request took {}s", sum - previous);
            previous = sum;
        }

        assert_eq!(hist.get_sample_count(), 50);
        // the clock is paused, so all observed time is simulated latency
        assert!(hist.get_sample_sum() > 0.0);
    }

    #[tokio::test]
    async fn test_add_without_price_defaults_to_zero() {
        let state = test_state();
        let app = router(state.clone());

        let res = send(
            &app,
            post_json(
                "/cart/add",
                json!({"user_id": "u1", "item": {"id": "a", "quantity": 1}}),
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);

        let cart = state.store.get_cart("u1").unwrap();
        assert_eq!(cart.items[0].price, rust_decimal::Decimal::ZERO);
        assert_eq!(cart.items[0].name, "");
    }

    #[tokio::test]
    async fn test_simulate_error_is_counted() {
        let state = test_state();
        let app = router(state.clone());

        let res = send(&app, get("/simulate-error")).await;
        let status = res.status();
        assert!(status.is_client_error() || status.is_server_error());

        let code = status.as_u16().to_string();
        let class = if status.is_server_error() {
            "server_error"
        } else {
            "client_error"
        };
        assert_eq!(
            state
                .metrics
                .requests_total
                .with_label_values(&["GET", "/simulate-error", code.as_str()])
                .get(),
            1
        );
        assert_eq!(
            state
                .metrics
                .errors_total
                .with_label_values(&[class, "/simulate-error", code.as_str()])
                .get(),
            1
        );
    }

    #[tokio::test]
    async fn test_health_and_metrics_endpoints() {
        let state = test_state();
        let app = router(state.clone());

        let res = send(&app, get("/health")).await;
        assert_eq!(res.status(), StatusCode::OK);
        let health: Value = serde_json::from_str(&body_text(res).await).unwrap();
        assert_eq!(health["status"], "healthy");
        assert_eq!(health["service"], "shopping-cart-service");

        state.metrics.cart_items.set(3);
        let res = send(&app, get("/metrics")).await;
        assert_eq!(res.status(), StatusCode::OK);
        let text = body_text(res).await;
        assert!(text.contains("cart_items_total 3"));
        assert!(text.contains("endpoint=\"/health\""));
        // scrapes themselves are not instrumented
        assert!(!text.contains("endpoint=\"/metrics\""));
    }

    #[tokio::test]
    async fn test_health_can_be_disabled() {
        let state = AppState::new(Config {
            enable_health: Some(false),
            simulate_latency: Some(false),
            ..Config::default()
        })
        .unwrap();
        let app = router(state);

        let res = send(&app, get("/health")).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
