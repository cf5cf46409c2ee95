//! CORS configuration backed by the origin allowlist.
//!
//! `tower-http`'s [`CorsLayer`] does the protocol work. It only echoes
//! origins the allowlist accepts, never `*`, and always sets `Vary`.
//! Preflights from denied origins are refused up front by
//! [`reject_denied_preflight`] instead of being answered without headers.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{
        header::{ACCESS_CONTROL_REQUEST_METHOD, ORIGIN, VARY},
        request::Parts,
        HeaderValue, Method, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tracing::{debug, warn};

use crate::verify::AllowedOrigins;
use crate::web::handlers::ErrorResponse;
use crate::Config;

/// Methods advertised to preflight requests.
pub const ALLOWED_METHODS: [Method; 3] = [Method::GET, Method::POST, Method::OPTIONS];

/// Preflight cache lifetime in seconds.
pub const MAX_AGE_SECS: u64 = 600;

/// Build the CORS layer for `origins`.
///
/// Requested headers are mirrored back; credentials are never allowed.
pub fn cors_layer(origins: &AllowedOrigins) -> CorsLayer {
    let origins = origins.clone();

    let allow_origin = AllowOrigin::predicate(move |origin: &HeaderValue, _parts: &Parts| {
        let origin = origin.to_str().ok();
        let allowed = origins.decide(origin).allowed();
        if !allowed {
            debug!(origin = origin.unwrap_or("<non-utf8>"), "cors_origin_rejected");
        }
        allowed
    });

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(ALLOWED_METHODS)
        .allow_headers(AllowHeaders::mirror_request())
        .max_age(Duration::from_secs(MAX_AGE_SECS))
}

fn is_preflight(req: &Request) -> bool {
    req.method() == Method::OPTIONS
        && req.headers().contains_key(ORIGIN)
        && req.headers().contains_key(ACCESS_CONTROL_REQUEST_METHOD)
}

/// Refuse preflights from origins outside the allowlist with a 400.
///
/// Must sit in front of [`cors_layer`], which would otherwise answer them.
pub async fn reject_denied_preflight(
    State(config): State<Arc<Config>>,
    req: Request,
    next: Next,
) -> Response {
    if is_preflight(&req) {
        let origin = req.headers().get(ORIGIN).and_then(|v| v.to_str().ok());
        if !config.allowed_origins.decide(origin).allowed() {
            warn!(
                origin = origin.unwrap_or("<non-utf8>"),
                "cors_preflight_rejected"
            );
            return (
                StatusCode::BAD_REQUEST,
                [(VARY, "origin")],
                Json(ErrorResponse::new(
                    "origin_not_allowed",
                    "Disallowed CORS origin",
                )),
            )
                .into_response();
        }
    }

    next.run(req).await
}
