//! Application configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SECRET_KEY` - Session secret (min 32 chars, high entropy). Optional when
//!   `DEBUG=true`, in which case an ephemeral key is generated.
//!
//! ## Optional
//! - `DATABASE_URL` - `SQLite` URL (default: `sqlite://data/family_planner.db`)
//! - `DEBUG` - `true` for development defaults (default: false)
//! - `HOST` - Bind address (default: 127.0.0.1)
//! - `PORT` - Listen port (default: 8080)
//! - `BASE_URL` - Public URL (default: `http://localhost:{PORT}`)
//! - `AUTO_MIGRATE` - Apply migrations on startup (default: true)
//! - `AUTH_RATE_LIMIT` - Rate limit `/auth/*` per client IP (default: true)
//! - `LOG_FORMAT` - `pretty` or `json` (default: pretty)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate, 0.0-1.0 (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate, 0.0-1.0 (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/family_planner.db";
const MIN_SECRET_KEY_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const GENERATED_SECRET_BYTES: usize = 48;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret-key",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-field lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Sentry error tracking settings.
#[derive(Debug, Clone, Default)]
pub struct SentryConfig {
    /// Sentry DSN; tracking is disabled when unset.
    pub dsn: Option<String>,
    /// Environment tag (e.g. `production`).
    pub environment: Option<String>,
    /// Fraction of errors to send.
    pub sample_rate: f32,
    /// Fraction of transactions to trace.
    pub traces_sample_rate: f32,
}

/// Family Planner application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `SQLite` connection URL
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL, used to decide whether cookies are `Secure`
    pub base_url: Url,
    /// Session secret
    pub secret_key: SecretString,
    /// Development mode
    pub debug: bool,
    /// Apply pending migrations before serving
    pub auto_migrate: bool,
    /// Rate limit the authentication endpoints
    pub auth_rate_limit: bool,
    /// Log output format
    pub log_format: LogFormat,
    /// Error tracking
    pub sentry: SentryConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is malformed, if `SECRET_KEY` is
    /// missing outside debug mode, or if the secret fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let debug = get_bool_env("DEBUG", false)?;
        let database_url =
            validate_database_url(&get_env_or_default("DATABASE_URL", DEFAULT_DATABASE_URL))?;
        let host = get_env_or_default("HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("PORT", "8080")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PORT".to_string(), e.to_string()))?;
        let base_url = get_env_or_default("BASE_URL", &format!("http://localhost:{port}"));
        let base_url = Url::parse(&base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("BASE_URL".to_string(), e.to_string()))?;

        let secret_key = match get_optional_env("SECRET_KEY") {
            Some(value) => {
                validate_secret_key(&value, "SECRET_KEY")?;
                SecretString::from(value)
            }
            None if debug => {
                tracing::warn!(
                    "SECRET_KEY not set; using an ephemeral key, sessions will not survive a restart"
                );
                generate_secret_key()
            }
            None => return Err(ConfigError::MissingEnvVar("SECRET_KEY".to_string())),
        };

        let log_format = match get_env_or_default("LOG_FORMAT", "pretty").as_str() {
            "pretty" => LogFormat::Pretty,
            "json" => LogFormat::Json,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "LOG_FORMAT".to_string(),
                    format!("expected 'pretty' or 'json', got '{other}'"),
                ));
            }
        };

        let sentry = SentryConfig {
            dsn: get_optional_env("SENTRY_DSN"),
            environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sample_rate: get_rate_env("SENTRY_SAMPLE_RATE", 1.0)?,
            traces_sample_rate: get_rate_env("SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
        };

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            secret_key,
            debug,
            auto_migrate: get_bool_env("AUTO_MIGRATE", true)?,
            auth_rate_limit: get_bool_env("AUTH_RATE_LIMIT", true)?,
            log_format,
            sentry,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the site is served over HTTPS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.scheme() == "https"
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable, treating an empty value as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse a boolean flag. Accepts `true`/`false`, `1`/`0`, `yes`/`no`.
fn get_bool_env(key: &str, default: bool) -> Result<bool, ConfigError> {
    get_optional_env(key).map_or(Ok(default), |value| parse_bool(&value).ok_or_else(|| {
        ConfigError::InvalidEnvVar(key.to_string(), format!("expected a boolean, got '{value}'"))
    }))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a sample rate between 0.0 and 1.0.
fn get_rate_env(key: &str, default: f32) -> Result<f32, ConfigError> {
    let Some(value) = get_optional_env(key) else {
        return Ok(default);
    };
    let rate = value
        .parse::<f32>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !(0.0..=1.0).contains(&rate) {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be between 0.0 and 1.0 (got {rate})"),
        ));
    }
    Ok(rate)
}

/// Accept only `SQLite` URLs.
fn validate_database_url(url: &str) -> Result<SecretString, ConfigError> {
    if url.starts_with("sqlite:") {
        return Ok(SecretString::from(url.to_string()));
    }
    let scheme = url.split(':').next().unwrap_or_default();
    Err(ConfigError::InvalidEnvVar(
        "DATABASE_URL".to_string(),
        format!("only sqlite: URLs are supported (got scheme '{scheme}')"),
    ))
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

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate length, placeholder patterns and entropy of a secret.
fn validate_secret_key(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    if secret.len() < MIN_SECRET_KEY_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {MIN_SECRET_KEY_LENGTH} characters (got {})",
                secret.len()
            ),
        ));
    }

    let lower = secret.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use `fp-cli secret` to generate one."
            ),
        ));
    }

    Ok(())
}

/// Generate a random URL-safe secret suitable for `SECRET_KEY`.
#[must_use]
pub fn generate_secret_key() -> SecretString {
    let mut bytes = [0_u8; GENERATED_SECRET_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    SecretString::from(URL_SAFE_NO_PAD.encode(bytes))
}

/// Minimal configuration for tests and tools that build an app in-process.
impl AppConfig {
    /// Build a debug configuration pointing at `database_url`.
    #[must_use]
    pub fn for_database(database_url: &str) -> Self {
        Self {
            database_url: SecretString::from(database_url.to_string()),
            host: IpAddr::from([127, 0, 0, 1]),
            port: 0,
            base_url: Url::parse("http://localhost").unwrap_or_else(|_| unreachable!()),
            secret_key: generate_secret_key(),
            debug: true,
            auto_migrate: true,
            auth_rate_limit: false,
            log_format: LogFormat::Pretty,
            sentry: SentryConfig::default(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        assert!((shannon_entropy("zzzzzz") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("abab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_key_too_short() {
        let err = validate_secret_key("Q7m!x2", "SECRET_KEY").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_key_placeholder() {
        let err = validate_secret_key("your-secret-key-here-0123456789abcdef", "SECRET_KEY")
            .unwrap_err();
        assert!(err.to_string().contains("placeholder"));
    }

    #[test]
    fn test_validate_secret_key_low_entropy() {
        let err = validate_secret_key(&"ab".repeat(20), "SECRET_KEY").unwrap_err();
        assert!(err.to_string().contains("entropy too low"));
    }

    #[test]
    fn test_validate_secret_key_valid() {
        assert!(validate_secret_key("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6e", "SECRET_KEY").is_ok());
    }

    #[test]
    fn test_generated_secret_passes_validation() {
        let secret = generate_secret_key();
        assert!(validate_secret_key(secret.expose_secret(), "SECRET_KEY").is_ok());
    }

    #[test]
    fn test_validate_database_url() {
        assert!(validate_database_url("sqlite://data/family_planner.db").is_ok());
        assert!(validate_database_url("sqlite::memory:").is_ok());
        let err = validate_database_url("postgres://localhost/planner").unwrap_err();
        assert!(err.to_string().contains("'postgres'"));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_socket_addr_and_secure_flag() {
        let mut config = AppConfig::for_database("sqlite::memory:");
        config.port = 8080;
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8080");
        assert!(!config.is_secure());

        config.base_url = Url::parse("https://planner.example.org").unwrap();
        assert!(config.is_secure());
    }
}
