//! Cross-origin allowlist matching.
//!
//! Origins are compared as exact, case-sensitive strings. On top of the
//! exact list, one single-level subdomain wildcard (Netlify deploy
//! previews) can be switched on.

use std::collections::HashSet;

/// Suffix shared by every Netlify deploy preview host.
pub const NETLIFY_PREVIEW_SUFFIX: &str = ".netlify.app";

const MAX_DNS_LABEL_LEN: usize = 63;

/// Matches `<scheme>://<label><suffix>` where `<label>` is exactly one DNS label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubdomainWildcard {
    scheme: String,
    suffix: String,
}

impl SubdomainWildcard {
    /// `suffix` includes its leading dot, e.g. `.netlify.app`.
    pub fn new(scheme: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            suffix: suffix.into(),
        }
    }

    /// `https://*.netlify.app`
    pub fn netlify_previews() -> Self {
        Self::new("https", NETLIFY_PREVIEW_SUFFIX)
    }

    pub fn matches(&self, origin: &str) -> bool {
        let Some(host) = origin
            .strip_prefix(self.scheme.as_str())
            .and_then(|rest| rest.strip_prefix("://"))
        else {
            return false;
        };

        match host.strip_suffix(self.suffix.as_str()) {
            Some(label) => is_dns_label(label),
            None => false,
        }
    }
}

/// A single DNS label: 1-63 letters, digits or hyphens, no leading or
/// trailing hyphen. Dots, ports and paths never qualify.
fn is_dns_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= MAX_DNS_LABEL_LEN
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

/// Result of checking a request's `Origin` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginDecision {
    /// No `Origin` header: not a cross-origin browser request.
    NotApplicable,
    /// Allowed; echo the literal request origin back.
    Allowed { echo_origin: String },
    Denied,
}

impl OriginDecision {
    pub fn allowed(&self) -> bool {
        matches!(self, OriginDecision::Allowed { .. })
    }

    pub fn echo_origin(&self) -> Option<&str> {
        match self {
            OriginDecision::Allowed { echo_origin } => Some(echo_origin.as_str()),
            _ => None,
        }
    }
}

/// Origins permitted to make cross-origin requests.
#[derive(Debug, Clone, Default)]
pub struct AllowedOrigins {
    exact: HashSet<String>,
    wildcard: Option<SubdomainWildcard>,
}

impl AllowedOrigins {
    pub fn new<I, S>(exact: I, wildcard: Option<SubdomainWildcard>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            exact: exact.into_iter().map(Into::into).collect(),
            wildcard,
        }
    }

    pub fn contains_exact(&self, origin: &str) -> bool {
        self.exact.contains(origin)
    }

    pub fn wildcard(&self) -> Option<&SubdomainWildcard> {
        self.wildcard.as_ref()
    }

    pub fn exact_len(&self) -> usize {
        self.exact.len()
    }

    /// Decide whether `request_origin` may access this service cross-origin.
    pub fn decide(&self, request_origin: Option<&str>) -> OriginDecision {
        let Some(origin) = request_origin else {
            return OriginDecision::NotApplicable;
        };

        let wildcard_match = self
            .wildcard
            .as_ref()
            .map(|w| w.matches(origin))
            .unwrap_or(false);

        if self.contains_exact(origin) || wildcard_match {
            OriginDecision::Allowed {
                echo_origin: origin.to_string(),
            }
        } else {
            OriginDecision::Denied
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origins(wildcard: bool) -> AllowedOrigins {
        AllowedOrigins::new(
            ["https://vividsuite.io", "http://localhost:4321"],
            wildcard.then(SubdomainWildcard::netlify_previews),
        )
    }

    #[test]
    fn test_absent_origin_not_applicable() {
        let decision = origins(true).decide(None);
        assert_eq!(decision, OriginDecision::NotApplicable);
        assert!(!decision.allowed());
        assert_eq!(decision.echo_origin(), None);
    }

    #[test]
    fn test_exact_match() {
        for wildcard in [true, false] {
            let decision = origins(wildcard).decide(Some("https://vividsuite.io"));
            assert!(decision.allowed());
            assert_eq!(decision.echo_origin(), Some("https://vividsuite.io"));
        }
    }

    #[test]
    fn test_exact_match_is_case_sensitive() {
        let set = origins(false);
        assert_eq!(set.decide(Some("https://VividSuite.io")), OriginDecision::Denied);
        assert_eq!(set.decide(Some("https://vividsuite.io/")), OriginDecision::Denied);
        assert_eq!(set.decide(Some("http://vividsuite.io")), OriginDecision::Denied);
    }

    #[test]
    fn test_netlify_preview_with_wildcard() {
        let decision = origins(true).decide(Some("https://preview-123.netlify.app"));
        assert!(decision.allowed());
        assert_eq!(
            decision.echo_origin(),
            Some("https://preview-123.netlify.app")
        );
    }

    #[test]
    fn test_netlify_preview_without_wildcard() {
        let decision = origins(false).decide(Some("https://preview-123.netlify.app"));
        assert_eq!(decision, OriginDecision::Denied);
    }

    #[test]
    fn test_unlisted_origin_denied() {
        for wildcard in [true, false] {
            let decision = origins(wildcard).decide(Some("https://evil.com"));
            assert!(!decision.allowed());
            assert_eq!(decision.echo_origin(), None);
        }
    }

    #[test]
    fn test_wildcard_rejects_lookalikes() {
        let set = origins(true);
        for origin in [
            "https://a.b.netlify.app",
            "https://netlify.app",
            "https://.netlify.app",
            "http://preview.netlify.app",
            "https://preview.netlify.app.evil.com",
            "https://preview-netlify.app",
            "https://preview.netlify.app:8443",
            "https://preview.netlify.app/path",
            "https://-preview.netlify.app",
            "https://preview-.netlify.app",
            "https://pre_view.netlify.app",
            "https://user@preview.netlify.app",
            "",
        ] {
            assert_eq!(set.decide(Some(origin)), OriginDecision::Denied, "{origin}");
        }
    }

    #[test]
    fn test_wildcard_label_length() {
        let wildcard = SubdomainWildcard::netlify_previews();
        let longest = format!("https://{}.netlify.app", "a".repeat(63));
        let too_long = format!("https://{}.netlify.app", "a".repeat(64));
        assert!(wildcard.matches(&longest));
        assert!(!wildcard.matches(&too_long));
    }

    #[test]
    fn test_custom_wildcard() {
        let wildcard = SubdomainWildcard::new("https", ".pages.dev");
        assert!(wildcard.matches("https://feature-x.pages.dev"));
        assert!(!wildcard.matches("https://feature-x.netlify.app"));
    }

    #[test]
    fn test_empty_set() {
        let set = AllowedOrigins::default();
        assert_eq!(set.exact_len(), 0);
        assert_eq!(set.decide(Some("https://vividsuite.io")), OriginDecision::Denied);
    }
}
