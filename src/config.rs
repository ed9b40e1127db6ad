//! Configuration management for the Rangemark server

use serde::Deserialize;
use std::env;

use crate::highlights::{HighlightColor, DEFAULT_MIN_SELECTION_LEN};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub highlights: HighlightSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HighlightSettings {
    /// Shortest trimmed selection accepted as a highlight
    pub min_selection_len: usize,
    /// Color used when a create request names none
    pub default_color: HighlightColor,
    /// CSS class prefix for rendered marks
    pub class_prefix: String,
}

/// Invalid environment configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: "sqlite:./rangemark.db".to_string(),
            },
            highlights: HighlightSettings::default(),
        }
    }
}

impl Default for HighlightSettings {
    fn default() -> Self {
        Self {
            min_selection_len: DEFAULT_MIN_SELECTION_LEN,
            default_color: HighlightColor::Yellow,
            class_prefix: "highlight".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: parse_var("SERVER_PORT", defaults.server.port)?,
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or(defaults.database.url),
            },
            highlights: HighlightSettings {
                min_selection_len: parse_var(
                    "HIGHLIGHT_MIN_SELECTION",
                    defaults.highlights.min_selection_len,
                )?,
                default_color: parse_var(
                    "HIGHLIGHT_DEFAULT_COLOR",
                    defaults.highlights.default_color,
                )?,
                class_prefix: env::var("HIGHLIGHT_CLASS_PREFIX")
                    .unwrap_or(defaults.highlights.class_prefix),
            },
        })
    }
}

/// Parse an optional variable, falling back to `default` when unset
fn parse_var<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        Err(_) => Ok(default),
    }
}
