//! HTTP layer.
//!
//! Thin axum router around the [`crate::verify`] gates:
//! - `GET /healthz`: liveness, no checks
//! - `GET /demo/example`: sample event, no checks
//! - `POST /demo/example`: requires a valid `X-Signature`
//!
//! Every route goes through the origin allowlist in [`cors`].

pub mod cors;
pub mod handlers;

use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

pub use handlers::{
    demo_example_get, demo_example_post, health, rejection_status, AppState,
    DemoExampleResponse, DemoReceivedResponse, ErrorResponse, HealthResponse, SERVICE_NAME,
};

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/demo/example", get(demo_example_get).post(demo_example_post))
        .layer(cors::cors_layer(&state.config.allowed_origins))
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            cors::reject_denied_preflight,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
