//! Structured logging and tracing for ejp-knx
//!
//! The output format and verbosity come from the environment:
//! `LOG_FORMAT` selects `json` or `text` and `LOG_LEVEL` names the level.
//! `RUST_LOG`, when set, replaces the whole filter.

mod level;
mod structured;

pub use level::{DEFAULT_LEVEL, LogFormat, level_from_env_value, parse_log_level};
pub use structured::{LogContext, StructuredLogger, get_logger, get_logger_with_context};

use crate::error::{EjpError, Result};
use once_cell::sync::OnceCell;
use std::sync::Once;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable selecting the output format
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Environment variable naming the log level
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// Filter directives replacing the defaults when set
pub const RUST_LOG_ENV: &str = "RUST_LOG";

static INIT_ONCE: Once = Once::new();
static INIT_ERROR: OnceCell<String> = OnceCell::new();

/// Logging settings resolved from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub format: LogFormat,
    pub level: Level,
    /// `RUST_LOG` directives, used instead of `level` when present
    pub directives: Option<String>,
}

impl LoggingSettings {
    /// Read `LOG_FORMAT`, `LOG_LEVEL` and `RUST_LOG`
    pub fn from_env() -> Self {
        let format = std::env::var(LOG_FORMAT_ENV).ok();
        let level = std::env::var(LOG_LEVEL_ENV).ok();
        let mut settings = Self::from_values(format.as_deref(), level.as_deref());
        settings.directives = std::env::var(RUST_LOG_ENV)
            .ok()
            .filter(|d| !d.trim().is_empty());
        settings
    }

    pub fn from_values(format: Option<&str>, level: Option<&str>) -> Self {
        Self {
            format: LogFormat::from_env_value(format),
            level: level_from_env_value(level),
            directives: None,
        }
    }

    /// Filter applied to every event
    ///
    /// `RUST_LOG` directives win over `LOG_LEVEL`. Invalid directives fall
    /// back to the level-based defaults.
    pub fn env_filter(&self) -> EnvFilter {
        self.directives
            .as_deref()
            .and_then(|d| EnvFilter::try_new(d).ok())
            .unwrap_or_else(|| EnvFilter::new(default_directives(self.level)))
    }
}

/// Initialize logging from the environment
pub fn init_from_env() -> Result<()> {
    init_logging(LoggingSettings::from_env())
}

/// Initialize logging system; later calls are no-ops
pub fn init_logging(settings: LoggingSettings) -> Result<()> {
    INIT_ONCE.call_once(|| {
        let console_layer = {
            let base = fmt::layer()
                .with_writer(std::io::stdout)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false);
            match settings.format {
                LogFormat::Json => base.json().boxed(),
                LogFormat::Text => base.boxed(),
            }
        };

        let result = tracing_subscriber::registry()
            .with(settings.env_filter())
            .with(console_layer)
            .try_init();

        match result {
            Ok(()) => info!(
                "Logging initialized - format: {:?}, level: {}",
                settings.format, settings.level
            ),
            Err(e) => {
                let _ = INIT_ERROR.set(e.to_string());
            }
        }
    });

    if let Some(err) = INIT_ERROR.get() {
        return Err(EjpError::validation(
            "logging".to_string(),
            format!("Failed to install subscriber: {}", err),
        ));
    }
    Ok(())
}

fn default_directives(level: Level) -> String {
    format!(
        "ejp_knx={},reqwest=warn,hyper=warn",
        level.as_str().to_ascii_lowercase()
    )
}
