//! Endpoint handlers.
//!
//! The signed endpoint verifies the raw body before anything else runs.
//! Nothing derived from the secret other than the caller's own verdict is
//! ever put into a response.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::verify::{sign, verify, SignatureError, SIGNATURE_HEADER};
use crate::Config;

/// Service name reported in every response body.
pub const SERVICE_NAME: &str = "webhook-handle";

const HOW_TO_TEST: &str = "POST JSON to /demo/example with header 'X-Signature: sha256=...' \
computed over the exact request body using your WEBHOOK_SECRET.";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

fn unix_time() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Error body returned for refused requests.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: &'static str, message: impl Into<String>) -> Self {
        Self {
            error,
            message: message.into(),
        }
    }
}

/// HTTP status for a rejected signature.
///
/// A missing secret is a server fault, everything else is the caller's.
pub fn rejection_status(err: &SignatureError) -> StatusCode {
    match err {
        SignatureError::ConfigMissingSecret => StatusCode::INTERNAL_SERVER_ERROR,
        SignatureError::MissingSignature
        | SignatureError::MalformedSignature(_)
        | SignatureError::SignatureMismatch => StatusCode::UNAUTHORIZED,
    }
}

impl IntoResponse for SignatureError {
    fn into_response(self) -> Response {
        (
            rejection_status(&self),
            Json(ErrorResponse::new(self.kind(), self.to_string())),
        )
            .into_response()
    }
}

// =============================================================================
// Health Check
// =============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub time: u64,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: SERVICE_NAME,
        time: unix_time(),
    })
}

// =============================================================================
// Demo Endpoint
// =============================================================================

/// Response for `GET /demo/example`.
#[derive(Serialize)]
pub struct DemoExampleResponse {
    pub service: &'static str,
    pub example: Value,
    /// Compact serialization of `example`; the bytes `signature_example` covers.
    pub example_body: String,
    pub how_to_test: &'static str,
    pub signature_example: Option<String>,
}

fn sample_event(received_at: u64) -> Value {
    json!({
        "event": "example.webhook",
        "id": "evt_demo_123",
        "received_at": received_at,
        "data": {
            "object": {
                "id": "obj_demo_123",
                "amount": 1999,
                "currency": "usd",
                "tags": ["demo", "webhook", "handle"]
            }
        }
    })
}

/// Synthetic webhook event plus a signature clients can replay.
pub async fn demo_example_get(State(state): State<AppState>) -> Json<DemoExampleResponse> {
    let example = sample_event(unix_time());
    let example_body = example.to_string();
    let signature_example = sign(&state.config.webhook_secret, example_body.as_bytes());

    Json(DemoExampleResponse {
        service: SERVICE_NAME,
        example,
        example_body,
        how_to_test: HOW_TO_TEST,
        signature_example,
    })
}

/// Response for an accepted `POST /demo/example`.
#[derive(Serialize)]
pub struct DemoReceivedResponse {
    pub service: &'static str,
    pub received_bytes: usize,
    pub received: Option<Value>,
    pub signature_valid: bool,
    pub time: u64,
}

/// Signed demo endpoint.
///
/// The body is taken as raw bytes so the signature covers exactly what
/// arrived on the wire. JSON parsing only happens after verification and
/// only for the echo in the response.
pub async fn demo_example_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .map(|v| v.to_str().unwrap_or_default());

    info!(
        body_length = body.len(),
        has_signature = signature.is_some(),
        "demo_webhook_received"
    );

    if let Err(err) = verify(&body, signature, &state.config.webhook_secret).into_result() {
        match err {
            SignatureError::ConfigMissingSecret => {
                error!(kind = err.kind(), "signature_rejected")
            }
            _ => warn!(kind = err.kind(), "signature_rejected"),
        }
        return err.into_response();
    }

    let received = serde_json::from_slice::<Value>(&body).ok();

    info!(
        body_length = body.len(),
        is_json = received.is_some(),
        "demo_webhook_accepted"
    );

    (
        StatusCode::OK,
        Json(DemoReceivedResponse {
            service: SERVICE_NAME,
            received_bytes: body.len(),
            received,
            signature_valid: true,
            time: unix_time(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verify::MalformedSignature;

    #[test]
    fn test_rejection_status() {
        assert_eq!(
            rejection_status(&SignatureError::MissingSignature),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            rejection_status(&SignatureError::MalformedSignature(
                MalformedSignature::InvalidHex
            )),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            rejection_status(&SignatureError::SignatureMismatch),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            rejection_status(&SignatureError::ConfigMissingSecret),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_sample_event_serializes_compactly() {
        let body = sample_event(1_700_000_000).to_string();
        assert!(!body.contains(' '));
        assert!(body.contains(r#""received_at":1700000000"#));
        assert!(body.contains(r#""event":"example.webhook""#));
    }
}
