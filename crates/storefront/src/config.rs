//! Shopper configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `KASHLY_BACKEND_URL` - Pricing service base URL (default: <http://127.0.0.1:8001>)
//! - `KASHLY_API_TOKEN` - Bearer token sent to the pricing service
//! - `KASHLY_REQUEST_TIMEOUT_SECS` - HTTP request timeout (default: 15)
//! - `KASHLY_SAMPLE_CACHE_TTL_SECS` - Sample quote cache TTL, 0 disables (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::collections::HashMap;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8001";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
const DEFAULT_SAMPLE_CACHE_TTL_SECS: u64 = 300;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.0;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Shopper application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Pricing service connection settings
    pub pricing: PricingServiceConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Pricing service connection settings.
///
/// Implements `Debug` manually to redact the API token.
#[derive(Clone)]
pub struct PricingServiceConfig {
    /// Service base URL; requests go to `{base_url}/api/...`
    pub base_url: Url,
    /// Optional bearer token
    pub api_token: Option<SecretString>,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// How long sample quotes stay cached; zero disables the cache
    pub sample_cache_ttl: Duration,
}

impl std::fmt::Debug for PricingServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PricingServiceConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("request_timeout", &self.request_timeout)
            .field("sample_cache_ttl", &self.sample_cache_ttl)
            .finish()
    }
}

impl PricingServiceConfig {
    /// Settings pointing at `base_url` with every other value defaulted.
    #[must_use]
    pub fn with_base_url(base_url: Url) -> Self {
        Self {
            base_url,
            api_token: None,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            sample_cache_ttl: Duration::from_secs(DEFAULT_SAMPLE_CACHE_TTL_SECS),
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is malformed or the API token
    /// looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`Self::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        let base_url = env.get_or_default("KASHLY_BACKEND_URL", DEFAULT_BACKEND_URL);
        let base_url = Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("KASHLY_BACKEND_URL".to_string(), e.to_string())
        })?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "KASHLY_BACKEND_URL".to_string(),
                "must be an http or https URL".to_string(),
            ));
        }

        let api_token = env
            .get_optional("KASHLY_API_TOKEN")
            .map(|token| validate_token(token, "KASHLY_API_TOKEN"))
            .transpose()?;

        let request_timeout = env.get_secs("KASHLY_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?;
        if request_timeout.is_zero() {
            return Err(ConfigError::InvalidEnvVar(
                "KASHLY_REQUEST_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let sample_cache_ttl =
            env.get_secs("KASHLY_SAMPLE_CACHE_TTL_SECS", DEFAULT_SAMPLE_CACHE_TTL_SECS)?;

        Ok(Self {
            pricing: PricingServiceConfig {
                base_url,
                api_token,
                request_timeout,
                sample_cache_ttl,
            },
            sentry_dsn: env.get_optional("SENTRY_DSN"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional variable, treating blank values as unset.
    fn get_optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
    }

    /// Get a variable with a default value.
    fn get_or_default(&self, key: &str, default: &str) -> String {
        self.get_optional(key)
            .unwrap_or_else(|| default.to_string())
    }

    /// Get a whole number of seconds.
    fn get_secs(&self, key: &str, default: u64) -> Result<Duration, ConfigError> {
        self.get_optional(key)
            .map_or(Ok(default), |value| value.parse::<u64>())
            .map(Duration::from_secs)
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // Token length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Reject placeholder and low-entropy tokens.
fn validate_token(token: String, var_name: &str) -> Result<SecretString, ConfigError> {
    let lower = token.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(&token);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(SecretString::from(token))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.pricing.base_url.as_str(), "http://127.0.0.1:8001/");
        assert!(config.pricing.api_token.is_none());
        assert_eq!(config.pricing.request_timeout, Duration::from_secs(15));
        assert_eq!(config.pricing.sample_cache_ttl, Duration::from_secs(300));
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("KASHLY_BACKEND_URL", "https://cod.example.net/shop"),
            ("KASHLY_REQUEST_TIMEOUT_SECS", "3"),
            ("KASHLY_SAMPLE_CACHE_TTL_SECS", "0"),
            ("SENTRY_DSN", "https://key@sentry.io/1"),
        ])
        .unwrap();
        assert_eq!(config.pricing.base_url.as_str(), "https://cod.example.net/shop");
        assert_eq!(config.pricing.request_timeout, Duration::from_secs(3));
        assert!(config.pricing.sample_cache_ttl.is_zero());
        assert_eq!(config.sentry_dsn.as_deref(), Some("https://key@sentry.io/1"));
    }

    #[test]
    fn test_blank_values_are_unset() {
        let config = load(&[("KASHLY_API_TOKEN", "   "), ("SENTRY_DSN", "")]).unwrap();
        assert!(config.pricing.api_token.is_none());
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_invalid_backend_url() {
        let err = load(&[("KASHLY_BACKEND_URL", "not a url")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "KASHLY_BACKEND_URL"));

        let err = load(&[("KASHLY_BACKEND_URL", "ftp://files.local")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_invalid_timeout() {
        let err = load(&[("KASHLY_REQUEST_TIMEOUT_SECS", "soon")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "KASHLY_REQUEST_TIMEOUT_SECS"));

        let err = load(&[("KASHLY_REQUEST_TIMEOUT_SECS", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_api_token_accepted() {
        let config = load(&[("KASHLY_API_TOKEN", "tok_9fK2xQ7mZ4pL1vR8")]).unwrap();
        assert_eq!(
            config.pricing.api_token.unwrap().expose_secret(),
            "tok_9fK2xQ7mZ4pL1vR8"
        );
    }

    #[test]
    fn test_api_token_placeholder_rejected() {
        let err = load(&[("KASHLY_API_TOKEN", "your-token-here")]).unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_api_token_low_entropy_rejected() {
        let err = load(&[("KASHLY_API_TOKEN", "aaaaaaaaaaaaaaaa")]).unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_shannon_entropy() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = PricingServiceConfig {
            api_token: Some(SecretString::from("tok_9fK2xQ7mZ4pL1vR8")),
            ..PricingServiceConfig::with_base_url(Url::parse("http://localhost:8001").unwrap())
        };
        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("tok_9fK2xQ7mZ4pL1vR8"));
    }
}
