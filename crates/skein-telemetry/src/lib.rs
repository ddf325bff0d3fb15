//! Skein Telemetry - logging setup.
//!
//! # Example
//!
//! ```rust,no_run
//! use skein_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), skein_telemetry::TelemetryError> {
//! let mut config = LogConfig::new("debug").with_directive("skein_matcher=trace");
//! config.format = LogFormat::Compact;
//!
//! setup_logging(&config)?;
//! tracing::info!("logging ready");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{LOG_FILE_PREFIX, LogConfig, LogFormat, LogTarget, setup_logging};
