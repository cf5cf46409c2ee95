//! Configuration module for environment variable parsing.
//!
//! Everything is read once at startup and never mutated afterwards.

use std::env;
use std::fmt;

use tracing::warn;

use crate::verify::{AllowedOrigins, SubdomainWildcard};

const DEFAULT_PORT: u16 = 8004;
const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:4321,https://vividsuite.io";

/// Shared HMAC secret.
///
/// The bytes never leave this type except as an HMAC key, and the `Debug`
/// impl is redacted so the secret cannot end up in logs by accident.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret(Vec<u8>);

impl Secret {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn expose(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("Secret(<empty>)")
        } else {
            f.write_str("Secret(<redacted>)")
        }
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value.as_bytes())
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// HMAC-SHA256 key for `X-Signature` verification (`WEBHOOK_SECRET`)
    pub webhook_secret: Secret,

    /// Origins permitted to make cross-origin browser requests
    pub allowed_origins: AllowedOrigins,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warn!(env_var = "PORT", value = %raw, "Invalid port, using default");
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        let webhook_secret = Secret::new(lookup("WEBHOOK_SECRET").unwrap_or_default());

        let origins = parse_csv(
            &lookup("ALLOWED_ORIGINS").unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string()),
        );

        let wildcard = parse_bool(lookup("ALLOW_NETLIFY_WILDCARD").as_deref(), true)
            .then(SubdomainWildcard::netlify_previews);

        Config {
            port,
            webhook_secret,
            allowed_origins: AllowedOrigins::new(origins, wildcard),
        }
    }
}

/// Parse a boolean flag. Only `1`, `true`, `yes` and `on` count as enabled.
fn parse_bool(raw: Option<&str>, default: bool) -> bool {
    match raw {
        Some(v) => matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        None => default,
    }
}

/// Parse a comma-separated list of strings, dropping blank entries.
fn parse_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);

        assert_eq!(config.port, 8004);
        assert!(config.webhook_secret.is_empty());
        assert!(config.allowed_origins.contains_exact("http://localhost:4321"));
        assert!(config.allowed_origins.contains_exact("https://vividsuite.io"));
        assert!(config.allowed_origins.wildcard().is_some());
    }

    #[test]
    fn test_explicit_values() {
        let config = config_from(&[
            ("PORT", "9000"),
            ("WEBHOOK_SECRET", "changeme"),
            ("ALLOWED_ORIGINS", " https://a.example , ,https://b.example"),
            ("ALLOW_NETLIFY_WILDCARD", "off"),
        ]);

        assert_eq!(config.port, 9000);
        assert_eq!(config.webhook_secret, Secret::from("changeme"));
        assert!(config.allowed_origins.contains_exact("https://a.example"));
        assert!(config.allowed_origins.contains_exact("https://b.example"));
        assert!(!config.allowed_origins.contains_exact("https://vividsuite.io"));
        assert!(config.allowed_origins.wildcard().is_none());
    }

    #[test]
    fn test_invalid_port_falls_back() {
        let config = config_from(&[("PORT", "not-a-port")]);
        assert_eq!(config.port, 8004);
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool(Some(" YES "), false));
        assert!(parse_bool(Some("1"), false));
        assert!(!parse_bool(Some("enabled"), true));
        assert!(!parse_bool(Some(""), true));
        assert!(parse_bool(None, true));
        assert!(!parse_bool(None, false));
    }

    #[test]
    fn test_parse_csv() {
        assert_eq!(parse_csv("foo, bar,, baz ,"), vec!["foo", "bar", "baz"]);
        assert!(parse_csv("").is_empty());
    }

    #[test]
    fn test_secret_debug_is_redacted() {
        let config = config_from(&[("WEBHOOK_SECRET", "super-secret-value")]);
        let rendered = format!("{:?}", config);

        assert!(!rendered.contains("super-secret-value"));
        assert!(rendered.contains("Secret(<redacted>)"));
    }
}
