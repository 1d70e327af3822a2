//! Observability.
//!
//! Anchorage emits `tracing` events and `metrics` counters. Installing a
//! subscriber or metrics recorder is left to the hosting process;
//! [`init_logging`] covers the common case.
//!
//! Counters:
//! - `anchorage_notes_saved_total`
//! - `anchorage_validation_failures_total`
//! - `anchorage_coverage_runs_total`

mod logging;

pub use logging::{LOG_ENV_VAR, LogFormat, LoggingConfig, init_logging};
