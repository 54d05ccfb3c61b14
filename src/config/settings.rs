//! Application settings and configuration
//!
//! This module provides configuration management for the application,
//! loading settings from environment variables with sensible defaults.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;

/// Application environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[value(alias = "dev")]
    Development,
    #[value(alias = "stage")]
    Staging,
    #[value(alias = "prod")]
    Production,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Development
    }
}

impl std::str::FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            _ => anyhow::bail!(
                "Invalid environment: {}. Expected: development, staging, or production",
                s
            ),
        }
    }
}

/// Gemini client configuration: credentials and retry policy knobs
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeminiSettings {
    /// API keys in rotation order (GEMINI_API_KEY_1..N, fallback GEMINI_API_KEY)
    #[serde(skip_serializing)]
    pub api_keys: Vec<String>,

    /// Shared attempt budget per logical request
    pub max_retries: u32,

    /// Delay after a 429 before retrying with the next key (milliseconds)
    pub retry_delay_rate_limited_ms: u64,

    /// Delay after a 503 before retrying with the same key (milliseconds)
    pub retry_delay_unavailable_ms: u64,

    /// Delay after a 5xx or timeout before retrying with the same key (milliseconds)
    pub retry_delay_server_error_ms: u64,

    /// HTTP request timeout in seconds
    pub request_timeout_secs: u64,

    /// Base URL override (tests point this at a local server)
    pub base_url: Option<String>,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            api_keys: Vec::new(),
            max_retries: 3,
            retry_delay_rate_limited_ms: 2000,
            retry_delay_unavailable_ms: 3000,
            retry_delay_server_error_ms: 2000,
            request_timeout_secs: 60,
            base_url: None,
        }
    }
}

/// Main application settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    // App settings
    pub app_name: String,
    pub app_version: String,
    pub environment: Environment,
    pub log_level: String,

    // Server settings
    pub host: String,
    pub port: u16,

    // Generated assets land here, kits in `<assets_dir>/<culture>_kit/`
    pub assets_dir: PathBuf,

    // Gemini client settings
    pub gemini: GeminiSettings,
}

impl Settings {
    /// Load settings from environment variables with defaults
    pub fn load() -> Result<Self> {
        // Load .env file if it exists (ignored in production typically)
        dotenvy::dotenv().ok();

        let settings = Self {
            app_name: env_or_default("APP_NAME", "heritageai"),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: env_or_default("ENVIRONMENT", "development")
                .parse()
                .unwrap_or_default(),
            log_level: env_or_default("LOG_LEVEL", "info"),

            host: env_or_default("HOST", "0.0.0.0"),
            port: env_or_default("PORT", "5000")
                .parse()
                .context("Invalid PORT value")?,

            assets_dir: PathBuf::from(env_or_default("ASSETS_DIR", "assets")),

            gemini: GeminiSettings {
                api_keys: load_api_keys(),
                max_retries: env_or_default("MAX_RETRIES", "3")
                    .parse()
                    .context("Invalid MAX_RETRIES value")?,
                retry_delay_rate_limited_ms: env_or_default("RETRY_DELAY_429", "2000")
                    .parse()
                    .context("Invalid RETRY_DELAY_429 value")?,
                retry_delay_unavailable_ms: env_or_default("RETRY_DELAY_503", "3000")
                    .parse()
                    .context("Invalid RETRY_DELAY_503 value")?,
                retry_delay_server_error_ms: env_or_default("RETRY_DELAY_500", "2000")
                    .parse()
                    .context("Invalid RETRY_DELAY_500 value")?,
                request_timeout_secs: env_or_default("REQUEST_TIMEOUT_SECONDS", "60")
                    .parse()
                    .context("Invalid REQUEST_TIMEOUT_SECONDS value")?,
                base_url: env::var("GEMINI_BASE_URL").ok(),
            },
        };

        Ok(settings)
    }

    /// Validate settings.
    ///
    /// Not part of `load()`: commands that never call the API (palette
    /// extraction, for one) run fine without credentials. Anything that
    /// talks to Gemini validates before doing work.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("Port cannot be 0");
        }

        // Missing credentials are fatal at startup, not at first call
        if self.gemini.api_keys.is_empty() {
            anyhow::bail!(
                "No Gemini API keys configured. Set GEMINI_API_KEY or GEMINI_API_KEY_1..N"
            );
        }

        if self.gemini.max_retries == 0 {
            anyhow::bail!("MAX_RETRIES must be > 0");
        }

        Ok(())
    }

    /// Check if running in development mode
    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    /// Check if running in production mode
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Get the server address string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Kit directory for a culture
    pub fn kit_dir(&self, culture: &str) -> PathBuf {
        self.assets_dir.join(format!("{}_kit", culture.to_lowercase()))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: "heritageai".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: Environment::Development,
            log_level: "info".to_string(),
            host: "0.0.0.0".to_string(),
            port: 5000,
            assets_dir: PathBuf::from("assets"),
            gemini: GeminiSettings::default(),
        }
    }
}

/// Load API keys from the environment.
///
/// Numbered keys (`GEMINI_API_KEY_1`, `GEMINI_API_KEY_2`, ...) are read in
/// order until the first gap; a bare `GEMINI_API_KEY` is the single-key
/// fallback for backward compatibility.
fn load_api_keys() -> Vec<String> {
    let mut keys = Vec::new();
    let mut i = 1;
    while let Ok(key) = env::var(format!("GEMINI_API_KEY_{}", i)) {
        if key.is_empty() {
            break;
        }
        keys.push(key);
        i += 1;
    }

    if keys.is_empty() {
        if let Ok(key) = env::var("GEMINI_API_KEY") {
            if !key.is_empty() {
                keys.push(key);
            }
        }
    }

    keys
}

/// Helper function to get environment variable with default
fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.app_name, "heritageai");
        assert_eq!(settings.port, 5000);
        assert_eq!(settings.gemini.max_retries, 3);
        assert_eq!(settings.gemini.retry_delay_rate_limited_ms, 2000);
        assert_eq!(settings.gemini.retry_delay_unavailable_ms, 3000);
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!(
            "development".parse::<Environment>().unwrap(),
            Environment::Development
        );
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Development);
        assert_eq!(
            "production".parse::<Environment>().unwrap(),
            Environment::Production
        );
        assert_eq!("prod".parse::<Environment>().unwrap(), Environment::Production);
    }

    #[test]
    fn test_server_addr() {
        let settings = Settings::default();
        assert_eq!(settings.server_addr(), "0.0.0.0:5000");
    }

    #[test]
    fn test_kit_dir() {
        let settings = Settings::default();
        assert_eq!(settings.kit_dir("Yoruba"), PathBuf::from("assets/yoruba_kit"));
    }
}
