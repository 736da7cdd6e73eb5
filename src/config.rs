//! Environment-based application configuration.
//!
//! Loads `.env` when present, then reads process environment variables.
//! Every variable except `DATABASE_URL` has a default.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::api::RateLimitConfig;
use crate::domain::{ConfigError, RetryPolicy};
use crate::infra::PostgresConfig;

/// Log output format selected by `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable output for development
    #[default]
    Pretty,
    /// One JSON object per line for log shippers
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("expected 'pretty' or 'json', got '{other}'")),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: SecretString,
    pub database: PostgresConfig,
    pub retry: RetryPolicy,
    pub run_migrations: bool,
    pub rate_limit_enabled: bool,
    pub rate_limit: RateLimitConfig,
    pub log_format: LogFormat,
    pub metrics_enabled: bool,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns [`ConfigError::MissingEnvVar`] when `DATABASE_URL` is unset and
    /// [`ConfigError::InvalidValue`] when a variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any variable source, such as a map.
    ///
    /// # Errors
    /// Same as [`AppConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        let database_url = vars
            .get("DATABASE_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?;

        let pool_defaults = PostgresConfig::default();
        let retry_defaults = RetryPolicy::default();
        let rate_defaults = RateLimitConfig::default();

        Ok(Self {
            host: vars.get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: vars.parse("PORT", 3000)?,
            database_url: SecretString::from(database_url),
            database: PostgresConfig {
                max_connections: vars
                    .parse("DATABASE_MAX_CONNECTIONS", pool_defaults.max_connections)?,
                min_connections: vars
                    .parse("DATABASE_MIN_CONNECTIONS", pool_defaults.min_connections)?,
                ..pool_defaults
            },
            retry: RetryPolicy {
                max_retries: vars.parse("DB_MAX_RETRIES", retry_defaults.max_retries)?,
                base_delay: Duration::from_millis(vars.parse(
                    "DB_RETRY_BASE_DELAY_MS",
                    retry_defaults.base_delay.as_millis() as u64,
                )?),
                max_delay: Duration::from_millis(vars.parse(
                    "DB_RETRY_MAX_DELAY_MS",
                    retry_defaults.max_delay.as_millis() as u64,
                )?),
            },
            run_migrations: vars.parse_bool("RUN_MIGRATIONS", true)?,
            rate_limit_enabled: vars.parse_bool("RATE_LIMIT_ENABLED", false)?,
            rate_limit: RateLimitConfig {
                general_rps: vars.parse("RATE_LIMIT_RPS", rate_defaults.general_rps)?,
                general_burst: vars.parse("RATE_LIMIT_BURST", rate_defaults.general_burst)?,
                ..rate_defaults
            },
            log_format: vars.parse("LOG_FORMAT", LogFormat::default())?,
            metrics_enabled: vars.parse_bool("METRICS_ENABLED", true)?,
        })
    }

    /// Socket address string to bind the HTTP listener to.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// A variable source with typed parsing.
struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
    }

    fn parse<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            Some(raw) => parse_value(key, &raw),
            None => Ok(default),
        }
    }

    fn parse_bool(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        match self.get(key) {
            Some(raw) => parse_bool(key, &raw),
            None => Ok(default),
        }
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: e.to_string(),
    })
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a boolean, got '{other}'"),
        }),
    }
}
