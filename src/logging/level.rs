use crate::error::{EjpError, Result};
use tracing::Level;

/// Level used when `LOG_LEVEL` is unset or unparseable
pub const DEFAULT_LEVEL: Level = Level::TRACE;

/// Parse log level string to tracing Level
///
/// `warning` is accepted as an alias of `warn`.
pub fn parse_log_level(level_str: &str) -> Result<Level> {
    match level_str.trim().to_uppercase().as_str() {
        "TRACE" => Ok(Level::TRACE),
        "DEBUG" => Ok(Level::DEBUG),
        "INFO" => Ok(Level::INFO),
        "WARN" | "WARNING" => Ok(Level::WARN),
        "ERROR" => Ok(Level::ERROR),
        _ => Err(EjpError::validation(
            "LOG_LEVEL".to_string(),
            format!("Invalid log level: {}", level_str),
        )),
    }
}

/// Resolve the level from an optional environment value
pub fn level_from_env_value(value: Option<&str>) -> Level {
    value
        .and_then(|v| parse_log_level(v).ok())
        .unwrap_or(DEFAULT_LEVEL)
}

/// Output format of the console layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Text,
}

impl LogFormat {
    /// Map a `LOG_FORMAT` value; anything unrecognised keeps the default
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("json") => Self::Json,
            Some("text") => Self::Text,
            _ => Self::default(),
        }
    }
}
