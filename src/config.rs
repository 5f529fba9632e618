//! Configuration management for Agent Builder.
//!
//! Configuration can be set via environment variables:
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `8000`.
//! - `GEOCODING_API_URL` - Optional. Open-Meteo geocoding base URL.
//! - `FORECAST_API_URL` - Optional. Open-Meteo forecast base URL.
//! - `GEMINI_API_URL` - Optional. Gemini API base URL.
//! - `MODEL_TEMPERATURE` - Optional. Sampling temperature. Defaults to `0.7`.
//! - `MAX_ITERATIONS` - Optional. Maximum model calls per chat turn. Defaults to `25`.
//! - `CORS_ALLOWED_ORIGINS` - Optional. Comma-separated origins, or `*`. Defaults to `*`.
//!
//! The model name and API key are not part of the server configuration: every
//! chat request carries its own.

use thiserror::Error;

pub const DEFAULT_GEOCODING_API_URL: &str = "https://geocoding-api.open-meteo.com";
pub const DEFAULT_FORECAST_API_URL: &str = "https://api.open-meteo.com";
pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Upstream endpoints used by the agent and its tools.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Open-Meteo geocoding API base URL
    pub geocoding_url: String,

    /// Open-Meteo forecast API base URL
    pub forecast_url: String,

    /// Gemini API base URL
    pub gemini_url: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            geocoding_url: DEFAULT_GEOCODING_API_URL.to_string(),
            forecast_url: DEFAULT_FORECAST_API_URL.to_string(),
            gemini_url: DEFAULT_GEMINI_API_URL.to_string(),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Sampling temperature passed to the model
    pub temperature: f32,

    /// Maximum model calls for one chat turn
    pub max_iterations: usize,

    /// Allowed CORS origins; `None` means any origin
    pub cors_origins: Option<Vec<String>>,

    /// Upstream API endpoints
    pub upstream: UpstreamConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            temperature: 0.7,
            max_iterations: 25,
            cors_origins: None,
            upstream: UpstreamConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a numeric variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let host = std::env::var("HOST").unwrap_or(defaults.host);

        let port = parse_env("PORT", defaults.port)?;
        let temperature = parse_env("MODEL_TEMPERATURE", defaults.temperature)?;
        let max_iterations = parse_env("MAX_ITERATIONS", defaults.max_iterations)?;
        if max_iterations == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_ITERATIONS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let cors_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .ok()
            .and_then(|v| parse_origins(&v));

        let upstream = UpstreamConfig {
            geocoding_url: env_url("GEOCODING_API_URL", DEFAULT_GEOCODING_API_URL),
            forecast_url: env_url("FORECAST_API_URL", DEFAULT_FORECAST_API_URL),
            gemini_url: env_url("GEMINI_API_URL", DEFAULT_GEMINI_API_URL),
        };

        Ok(Self {
            host,
            port,
            temperature,
            max_iterations,
            cors_origins,
            upstream,
        })
    }

    /// Socket address string the server binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ConfigError::InvalidValue(key.to_string(), format!("{}", e))),
        Err(_) => Ok(default),
    }
}

fn env_url(key: &str, default: &str) -> String {
    std::env::var(key)
        .map(|v| v.trim_end_matches('/').to_string())
        .unwrap_or_else(|_| default.to_string())
}

/// Parse a comma-separated origin list. `*` or an empty list means "any origin".
fn parse_origins(value: &str) -> Option<Vec<String>> {
    let origins: Vec<String> = value
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect();

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        None
    } else {
        Some(origins)
    }
}
