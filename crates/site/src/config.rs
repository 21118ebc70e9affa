//! Site configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SITE_BASE_URL` - Public URL of the site (canonical links, sitemap)
//! - `SMTP_HOST` - SMTP relay host (STARTTLS)
//! - `SMTP_USERNAME` - SMTP relay user
//! - `SMTP_PASSWORD` - SMTP relay password
//! - `MAIL_FROM` - Sender mailbox for outbound notifications
//! - `MAIL_TO` - Business mailbox that receives every lead and order
//!
//! ## Optional
//! - `SITE_HOST` - Bind address (default: 127.0.0.1)
//! - `SITE_PORT` - Listen port (default: 3000)
//! - `SITE_CONTENT_DIR` - JSON and Markdown content (default: crates/site/content)
//! - `SITE_STATIC_DIR` - Static assets (default: crates/site/static)
//! - `SITE_UPLOAD_DIR` - Cart blob store root (default: data/uploads)
//! - `CART_METADATA_LIMIT` - Cart metadata ceiling in bytes (default: 65536)
//! - `CART_BLOB_QUOTA` - Per-cart upload quota in bytes (default: 60 MiB)
//! - `CART_BLOB_MAX_AGE_HOURS` - Age after which abandoned uploads are swept (default: 168)
//! - `SMTP_PORT` - SMTP relay port (default: 587)
//! - `BUSINESS_PHONE` - Phone number shown on the site
//! - `BUSINESS_WHATSAPP` - WhatsApp number for the site's own chat button
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Trace sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

const DEFAULT_METADATA_LIMIT: usize = 64 * 1024;
const DEFAULT_BLOB_QUOTA: u64 = 60 * 1024 * 1024;
const DEFAULT_BLOB_MAX_AGE_HOURS: u64 = 7 * 24;

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

/// Site application configuration.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL, without a trailing slash
    pub base_url: String,
    /// JSON + Markdown content directory
    pub content_dir: PathBuf,
    /// Static asset directory
    pub static_dir: PathBuf,
    /// Cart storage limits and locations
    pub cart: CartConfig,
    /// Outbound mail relay
    pub email: EmailConfig,
    /// Business contact numbers shown on pages
    pub business: BusinessConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Error event sample rate
    pub sentry_sample_rate: f32,
    /// Performance trace sample rate
    pub sentry_traces_sample_rate: f32,
}

/// Cart metadata and upload storage configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Root directory of the blob store
    pub upload_dir: PathBuf,
    /// Largest cart metadata document in bytes
    pub metadata_limit: usize,
    /// Per-cart upload quota in bytes
    pub blob_quota: u64,
    /// Abandoned cart uploads older than this are swept
    pub blob_max_age: Duration,
}

/// SMTP relay configuration.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: SecretString,
    /// Sender mailbox, e.g. `Signpress Website <web@signpress.ae>`
    pub from_address: String,
    /// Business mailbox receiving every notification
    pub to_address: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .field("to_address", &self.to_address)
            .finish()
    }
}

/// Business contact details used by page CTAs.
#[derive(Debug, Clone)]
pub struct BusinessConfig {
    /// Phone number as displayed
    pub phone: String,
    /// WhatsApp number as displayed
    pub whatsapp: String,
}

impl Default for BusinessConfig {
    fn default() -> Self {
        Self {
            phone: "+971 4 000 0000".to_string(),
            whatsapp: "+971 4 000 0000".to_string(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the SMTP password looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env("SITE_HOST", "127.0.0.1")?;
        let port = parse_env("SITE_PORT", "3000")?;
        let base_url = get_required_env("SITE_BASE_URL")?
            .trim_end_matches('/')
            .to_string();
        url::Url::parse(&base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("SITE_BASE_URL".to_string(), e.to_string()))?;

        let content_dir = PathBuf::from(get_env_or_default(
            "SITE_CONTENT_DIR",
            "crates/site/content",
        ));
        let static_dir = PathBuf::from(get_env_or_default("SITE_STATIC_DIR", "crates/site/static"));

        let cart = CartConfig::from_env()?;
        let email = EmailConfig::from_env()?;
        let business = BusinessConfig::from_env();

        Ok(Self {
            host,
            port,
            base_url,
            content_dir,
            static_dir,
            cart,
            email,
            business,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Absolute URL for a site path.
    #[must_use]
    pub fn absolute_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl CartConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let max_age_hours: u64 = parse_env(
            "CART_BLOB_MAX_AGE_HOURS",
            &DEFAULT_BLOB_MAX_AGE_HOURS.to_string(),
        )?;
        Ok(Self {
            upload_dir: PathBuf::from(get_env_or_default("SITE_UPLOAD_DIR", "data/uploads")),
            metadata_limit: parse_env("CART_METADATA_LIMIT", &DEFAULT_METADATA_LIMIT.to_string())?,
            blob_quota: parse_env("CART_BLOB_QUOTA", &DEFAULT_BLOB_QUOTA.to_string())?,
            blob_max_age: Duration::from_secs(max_age_hours * 60 * 60),
        })
    }
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("data/uploads"),
            metadata_limit: DEFAULT_METADATA_LIMIT,
            blob_quota: DEFAULT_BLOB_QUOTA,
            blob_max_age: Duration::from_secs(DEFAULT_BLOB_MAX_AGE_HOURS * 60 * 60),
        }
    }
}

impl EmailConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            smtp_host: get_required_env("SMTP_HOST")?,
            smtp_port: parse_env("SMTP_PORT", "587")?,
            smtp_username: get_required_env("SMTP_USERNAME")?,
            smtp_password: get_validated_secret("SMTP_PASSWORD")?,
            from_address: get_required_env("MAIL_FROM")?,
            to_address: get_required_env("MAIL_TO")?,
        })
    }

    /// SMTP password for transport construction.
    #[must_use]
    pub fn password(&self) -> &str {
        self.smtp_password.expose_secret()
    }
}

impl BusinessConfig {
    fn from_env() -> Self {
        let defaults = Self::default();
        let phone = get_optional_env("BUSINESS_PHONE").unwrap_or(defaults.phone);
        let whatsapp = get_optional_env("BUSINESS_WHATSAPP").unwrap_or_else(|| phone.clone());
        Self { phone, whatsapp }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Validate that a secret is not a placeholder.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    if secret.trim().is_empty() {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            "must not be empty".to_string(),
        ));
    }

    let lower = secret.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn email_config() -> EmailConfig {
        EmailConfig {
            smtp_host: "smtp.example.net".to_string(),
            smtp_port: 587,
            smtp_username: "web@signpress.ae".to_string(),
            smtp_password: SecretString::from("s3cr3t-relay-pass"),
            from_address: "Signpress Website <web@signpress.ae>".to_string(),
            to_address: "sales@signpress.ae".to_string(),
        }
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-smtp-password", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_changeme() {
        assert!(validate_secret_strength("ChangeMe123", "TEST_VAR").is_err());
    }

    #[test]
    fn test_validate_secret_strength_empty() {
        assert!(validate_secret_strength("  ", "TEST_VAR").is_err());
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        assert!(validate_secret_strength("Qm9v-7rT!x2pLz", "TEST_VAR").is_ok());
    }

    #[test]
    fn test_parse_env_default_and_invalid() {
        let port: u16 = parse_env("SIGNPRESS_TEST_UNSET_PORT", "3000").unwrap();
        assert_eq!(port, 3000);

        let result: Result<u16, _> = parse_env("SIGNPRESS_TEST_UNSET_BAD", "not-a-port");
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_socket_addr_and_absolute_url() {
        let config = SiteConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "https://signpress.ae".to_string(),
            content_dir: PathBuf::from("content"),
            static_dir: PathBuf::from("static"),
            cart: CartConfig::default(),
            email: email_config(),
            business: BusinessConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
        assert_eq!(
            config.absolute_url("/services/signage"),
            "https://signpress.ae/services/signage"
        );
    }

    #[test]
    fn test_email_config_debug_redacts_password() {
        let debug_output = format!("{:?}", email_config());

        assert!(debug_output.contains("smtp.example.net"));
        assert!(debug_output.contains("sales@signpress.ae"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("s3cr3t-relay-pass"));
    }
}
