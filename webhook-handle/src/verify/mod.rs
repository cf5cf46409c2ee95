//! Request authorization checks.
//!
//! Two independent, stateless gates:
//! - [`signature`]: HMAC-SHA256 over the exact request body
//! - [`origin`]: allowlist for cross-origin browser requests
//!
//! Both are pure functions of the request data and the configuration
//! loaded at startup, so they are safe to call from any number of
//! concurrent handlers.

pub mod origin;
pub mod signature;

pub use origin::{AllowedOrigins, OriginDecision, SubdomainWildcard, NETLIFY_PREVIEW_SUFFIX};
pub use signature::{
    parse_signature_header, sign, verify, Algorithm, MalformedSignature, SignatureError,
    SignatureHeader, Verdict, DIGEST_LEN, SIGNATURE_HEADER,
};
