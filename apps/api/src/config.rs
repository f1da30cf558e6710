use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::llm_client::{GeminiConfig, RetryPolicy, DEFAULT_ENDPOINT};

const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Application configuration loaded from environment variables.
///
/// The generation credential is optional: without it every analysis fails
/// fast with a missing-credential error instead of refusing to start.
#[derive(Clone)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub gemini_api_url: String,
    pub gemini_timeout_secs: u64,
    pub gemini_max_attempts: u32,
    pub database_url: Option<String>,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("gemini_api_key", &self.gemini_api_key.as_ref().map(|_| "<redacted>"))
            .field("gemini_api_url", &self.gemini_api_url)
            .field("gemini_timeout_secs", &self.gemini_timeout_secs)
            .field("gemini_max_attempts", &self.gemini_max_attempts)
            .field("database_url", &self.database_url.as_ref().map(|_| "<redacted>"))
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("port", &self.port)
            .field("rust_log", &self.rust_log)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            gemini_api_key: None,
            gemini_api_url: DEFAULT_ENDPOINT.to_string(),
            gemini_timeout_secs: retry.timeout.as_secs(),
            gemini_max_attempts: retry.max_attempts,
            database_url: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            port: 8080,
            rust_log: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process env.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Config::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Config {
            gemini_api_key: non_empty("GEMINI_API_KEY"),
            gemini_api_url: non_empty("GEMINI_API_URL").unwrap_or(defaults.gemini_api_url),
            gemini_timeout_secs: parse_or("GEMINI_TIMEOUT_SECS", &lookup, defaults.gemini_timeout_secs)?,
            gemini_max_attempts: parse_or("GEMINI_MAX_ATTEMPTS", &lookup, defaults.gemini_max_attempts)?,
            database_url: non_empty("DATABASE_URL"),
            max_upload_bytes: parse_or("MAX_UPLOAD_BYTES", &lookup, defaults.max_upload_bytes)?,
            port: parse_or("PORT", &lookup, defaults.port)?,
            rust_log: lookup("RUST_LOG").unwrap_or(defaults.rust_log),
        })
    }

    /// Settings handed to the generation client at construction.
    pub fn gemini_config(&self) -> GeminiConfig {
        GeminiConfig {
            endpoint: self.gemini_api_url.clone(),
            api_key: self.gemini_api_key.clone(),
            retry: RetryPolicy {
                max_attempts: self.gemini_max_attempts.max(1),
                timeout: Duration::from_secs(self.gemini_timeout_secs),
                retry_server_errors: false,
            },
        }
    }
}

fn parse_or<T>(key: &str, lookup: &impl Fn(&str) -> Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}
