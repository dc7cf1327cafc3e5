//! Engine configuration parsed from the page's URL query string.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use crate::consts::{DEFAULT_PAGE_HEIGHT, ERASER_SIZE, HISTORY_LIMIT};

/// Configuration error for a query parameter with an unusable value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value `{value}` for `{key}`: {reason}")]
    InvalidValue { key: &'static str, value: String, reason: &'static str },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Log every classification decision at debug level.
    pub debug_input: bool,
    /// Maximum retained history markers.
    pub history_limit: usize,
    /// Eraser brush diameter in pixels.
    pub eraser_size: f64,
    /// Initial scrollable page height in canvas pixels.
    pub page_height: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { debug_input: false, history_limit: HISTORY_LIMIT, eraser_size: ERASER_SIZE, page_height: DEFAULT_PAGE_HEIGHT }
    }
}

impl EngineConfig {
    /// Build typed config from a URL query string (with or without the leading `?`).
    ///
    /// Recognised:
    /// - `debug`: `pen` enables input debugging
    /// - `history_limit`: positive integer, default 50
    /// - `eraser_size`: positive number, default 20
    /// - `page_height`: non-negative number, default 3000
    ///
    /// Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a recognised key with an unusable value.
    pub fn from_query(query: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let query = query.strip_prefix('?').unwrap_or(query);

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            match key {
                "debug" => {
                    config.debug_input = value.split(',').any(|v| v == "pen");
                }
                "history_limit" => {
                    config.history_limit = parse_positive_usize("history_limit", value)?;
                }
                "eraser_size" => {
                    config.eraser_size = parse_f64("eraser_size", value, |v| v > 0.0, "must be positive")?;
                }
                "page_height" => {
                    config.page_height = parse_f64("page_height", value, |v| v >= 0.0, "must not be negative")?;
                }
                _ => {}
            }
        }
        Ok(config)
    }

    /// Log level for the browser console backend.
    #[must_use]
    pub fn log_level(&self) -> log::Level {
        if self.debug_input { log::Level::Debug } else { log::Level::Info }
    }
}

fn parse_positive_usize(key: &'static str, value: &str) -> Result<usize, ConfigError> {
    match value.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        Ok(_) => Err(ConfigError::InvalidValue { key, value: value.to_owned(), reason: "must be positive" }),
        Err(_) => Err(ConfigError::InvalidValue { key, value: value.to_owned(), reason: "not an integer" }),
    }
}

fn parse_f64(key: &'static str, value: &str, valid: impl Fn(f64) -> bool, reason: &'static str) -> Result<f64, ConfigError> {
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() && valid(v) => Ok(v),
        Ok(_) => Err(ConfigError::InvalidValue { key, value: value.to_owned(), reason }),
        Err(_) => Err(ConfigError::InvalidValue { key, value: value.to_owned(), reason: "not a number" }),
    }
}
