//! Configuration management for the proxy.
//!
//! All settings come from environment variables (a `.env` file is loaded first
//! when present). Four of them are required; the rest have defaults.

use anyhow::{Context, Result};
use std::fmt;
use std::path::PathBuf;

/// Main application configuration.
#[derive(Clone)]
pub struct AppConfig {
    /// Server bind configuration
    pub server: ServerConfig,

    /// Upstream completion API
    pub upstream: UpstreamConfig,

    /// Bearer secret callers must present in `Authorization`
    pub authorization_key: String,

    /// Salt mixed into hashed caller identities
    pub uid_hash_salt: String,

    /// Audit log destination; `None` discards records
    pub audit_log_path: Option<PathBuf>,

    /// Maximum accepted inbound body size in bytes
    pub max_body_bytes: usize,
}

/// Upstream API configuration.
#[derive(Clone)]
pub struct UpstreamConfig {
    /// Base URL requests are forwarded to (path and query are appended)
    pub api_base: String,

    /// Credential sent upstream as `Authorization: Bearer <api_key>`
    pub api_key: String,

    /// Ceiling for connecting and receiving response headers, in seconds
    pub request_timeout_secs: u64,

    /// Whether to verify SSL certificates for upstream requests
    pub verify_ssl: bool,
}

/// Server-specific configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_request_timeout() -> u64 {
    20
}

fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Required: `OPENAI_API_BASE`, `OPENAI_API_KEY`, `AUTHORIZATION_KEY`,
    /// `UID_HASH_SALT`.
    ///
    /// Optional: `OPENAI_REQ_LOG_FILE`, `HOST`, `PORT`, `REQUEST_TIMEOUT_SECS`,
    /// `VERIFY_SSL`, `MAX_BODY_BYTES`.
    pub fn from_env() -> Result<Self> {
        let api_base = required_var("OPENAI_API_BASE")?;
        reqwest::Url::parse(&api_base)
            .with_context(|| format!("OPENAI_API_BASE is not a valid URL: {}", api_base))?;

        let upstream = UpstreamConfig {
            api_base,
            api_key: required_var("OPENAI_API_KEY")?,
            request_timeout_secs: parsed_var("REQUEST_TIMEOUT_SECS")?
                .unwrap_or_else(default_request_timeout),
            verify_ssl: optional_var("VERIFY_SSL")
                .map(|v| str_to_bool(&v))
                .unwrap_or(true),
        };

        let server = ServerConfig {
            host: optional_var("HOST").unwrap_or_else(default_host),
            port: parsed_var("PORT")?.unwrap_or_else(default_port),
        };

        Ok(Self {
            server,
            upstream,
            authorization_key: required_var("AUTHORIZATION_KEY")?,
            uid_hash_salt: required_var("UID_HASH_SALT")?,
            audit_log_path: optional_var("OPENAI_REQ_LOG_FILE").map(PathBuf::from),
            max_body_bytes: parsed_var("MAX_BODY_BYTES")?.unwrap_or_else(default_max_body_bytes),
        })
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("server", &self.server)
            .field("upstream", &self.upstream)
            .field("authorization_key", &"<redacted>")
            .field("uid_hash_salt", &"<redacted>")
            .field("audit_log_path", &self.audit_log_path)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish()
    }
}

impl fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("api_base", &self.api_base)
            .field("api_key", &"<redacted>")
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("verify_ssl", &self.verify_ssl)
            .finish()
    }
}

/// Read a variable, treating empty values as unset.
fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn required_var(name: &str) -> Result<String> {
    optional_var(name).with_context(|| format!("{} environment variable is required", name))
}

fn parsed_var<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    optional_var(name)
        .map(|v| {
            v.trim()
                .parse::<T>()
                .with_context(|| format!("Invalid value for {}: {}", name, v))
        })
        .transpose()
}

/// Convert string to boolean.
///
/// Accepts: "true", "1", "yes", "on" (case-insensitive)
fn str_to_bool(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}
