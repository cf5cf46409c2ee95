//! `X-Signature` webhook signature verification.
//!
//! Senders sign the exact request body with HMAC-SHA256 using the shared
//! secret and send the digest as `X-Signature: sha256=<hex>`.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use tracing::warn;

use crate::config::Secret;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the body signature.
pub const SIGNATURE_HEADER: &str = "x-signature";

/// Length of an HMAC-SHA256 digest in bytes.
pub const DIGEST_LEN: usize = 32;

/// Ways a signature header can fail to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MalformedSignature {
    #[error("signature header is empty")]
    Empty,

    #[error("signature header has no algorithm prefix")]
    MissingAlgorithm,

    #[error("unsupported signature algorithm")]
    UnsupportedAlgorithm,

    #[error("signature digest is not valid hex")]
    InvalidHex,

    #[error("signature digest must be {expected} bytes, got {actual}")]
    WrongLength { expected: usize, actual: usize },
}

/// Reasons a request is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("missing X-Signature header")]
    MissingSignature,

    #[error("malformed X-Signature header: {0}")]
    MalformedSignature(#[from] MalformedSignature),

    #[error("signature does not match payload")]
    SignatureMismatch,

    #[error("webhook secret is not configured")]
    ConfigMissingSecret,
}

impl SignatureError {
    /// Stable machine-readable code for responses and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SignatureError::MissingSignature => "missing_signature",
            SignatureError::MalformedSignature(_) => "malformed_signature",
            SignatureError::SignatureMismatch => "signature_mismatch",
            SignatureError::ConfigMissingSecret => "config_missing_secret",
        }
    }
}

/// Outcome of verifying one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected(SignatureError),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }

    pub fn into_result(self) -> Result<(), SignatureError> {
        match self {
            Verdict::Accepted => Ok(()),
            Verdict::Rejected(err) => Err(err),
        }
    }
}

/// Supported signature algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Sha256,
}

impl Algorithm {
    pub fn tag(&self) -> &'static str {
        match self {
            Algorithm::Sha256 => "sha256",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        if tag.eq_ignore_ascii_case("sha256") {
            Some(Algorithm::Sha256)
        } else {
            None
        }
    }
}

/// A well-formed `<algorithm>=<hex>` header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    algorithm: Algorithm,
    digest: [u8; DIGEST_LEN],
}

impl SignatureHeader {
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn digest(&self) -> &[u8; DIGEST_LEN] {
        &self.digest
    }
}

/// Parse an `X-Signature` header value.
///
/// Total: every input maps to either a decoded digest or the specific way
/// it is malformed. The hex digest may be upper- or lowercase, but must
/// decode to exactly [`DIGEST_LEN`] bytes.
pub fn parse_signature_header(value: &str) -> Result<SignatureHeader, MalformedSignature> {
    let value = value.trim();
    if value.is_empty() {
        return Err(MalformedSignature::Empty);
    }

    let (tag, hex_digest) = value
        .split_once('=')
        .ok_or(MalformedSignature::MissingAlgorithm)?;

    let algorithm = Algorithm::from_tag(tag).ok_or(MalformedSignature::UnsupportedAlgorithm)?;

    let bytes = hex::decode(hex_digest).map_err(|_| MalformedSignature::InvalidHex)?;
    let digest: [u8; DIGEST_LEN] = bytes.as_slice().try_into().map_err(|_| {
        MalformedSignature::WrongLength {
            expected: DIGEST_LEN,
            actual: bytes.len(),
        }
    })?;

    Ok(SignatureHeader { algorithm, digest })
}

/// Verify `raw_body` against an `X-Signature` header value.
///
/// `raw_body` must be the exact bytes received on the wire. An empty secret
/// rejects every request.
pub fn verify(raw_body: &[u8], header: Option<&str>, secret: &Secret) -> Verdict {
    let Some(expected) = hmac_sha256(secret, raw_body) else {
        return Verdict::Rejected(SignatureError::ConfigMissingSecret);
    };

    let Some(header) = header else {
        return Verdict::Rejected(SignatureError::MissingSignature);
    };

    let supplied = match parse_signature_header(header) {
        Ok(supplied) => supplied,
        Err(malformed) => return Verdict::Rejected(malformed.into()),
    };

    if constant_time_compare(&expected, supplied.digest()) {
        Verdict::Accepted
    } else {
        Verdict::Rejected(SignatureError::SignatureMismatch)
    }
}

/// Compute the `sha256=<hex>` header value for `raw_body`.
///
/// Returns `None` when no secret is configured.
pub fn sign(secret: &Secret, raw_body: &[u8]) -> Option<String> {
    hmac_sha256(secret, raw_body)
        .map(|digest| format!("{}={}", Algorithm::Sha256.tag(), hex::encode(digest)))
}

fn hmac_sha256(secret: &Secret, message: &[u8]) -> Option<[u8; DIGEST_LEN]> {
    if secret.is_empty() {
        return None;
    }

    let mut mac = match HmacSha256::new_from_slice(secret.expose()) {
        Ok(m) => m,
        Err(_) => {
            warn!("signature_invalid_key");
            return None;
        }
    };

    mac.update(message);

    let mut digest = [0u8; DIGEST_LEN];
    digest.copy_from_slice(&mac.finalize().into_bytes());
    Some(digest)
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
