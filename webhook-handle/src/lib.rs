//! webhook-handle - Minimal signed webhook receiver.
//!
//! This library provides the pieces used by both binaries:
//! - `webhook-handle`: HTTP server for the demo webhook endpoints
//! - `webhook-sign`: helper that prints the `X-Signature` for a body
//!
//! ## Request Flow
//!
//! ```text
//! Request → CORS (origin allowlist) → Handler → Signature check → Response
//! ```

pub mod config;
pub mod verify;
pub mod web;

// Re-export commonly used types
pub use config::{Config, Secret};
pub use verify::{AllowedOrigins, OriginDecision, SignatureError, Verdict};
pub use web::{router, AppState};
