//! Structured logging setup.

use crate::{Error, Result};
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable holding the log filter directives.
pub const LOG_ENV_VAR: &str = "ANCHORAGE_LOG";

/// Environment variable selecting the output format (`json` or `pretty`).
const LOG_FORMAT_ENV_VAR: &str = "ANCHORAGE_LOG_FORMAT";

static LOGGING_INIT: OnceLock<()> = OnceLock::new();

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parses a format name, falling back to [`LogFormat::Pretty`].
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Logging configuration.
#[derive(Debug)]
pub struct LoggingConfig {
    /// Event filter.
    pub filter: EnvFilter,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: EnvFilter::new("info"),
            format: LogFormat::default(),
        }
    }
}

impl LoggingConfig {
    /// Reads [`LOG_ENV_VAR`] and `ANCHORAGE_LOG_FORMAT`, defaulting to `info`
    /// and pretty output.
    #[must_use]
    pub fn from_env() -> Self {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info"));
        let format = std::env::var(LOG_FORMAT_ENV_VAR)
            .map(|v| LogFormat::parse(&v))
            .unwrap_or_default();
        Self { filter, format }
    }
}

/// Installs the global tracing subscriber.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if logging was already initialized or
/// another global subscriber is installed.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    if LOGGING_INIT.get().is_some() {
        return Err(Error::failed("logging_init", "logging already initialized"));
    }

    match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true),
            )
            .with(config.filter)
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().pretty().with_target(true))
            .with(config.filter)
            .try_init(),
    }
    .map_err(|e| Error::failed("logging_init", e))?;

    LOGGING_INIT
        .set(())
        .map_err(|()| Error::failed("logging_init", "failed to mark logging initialized"))
}
