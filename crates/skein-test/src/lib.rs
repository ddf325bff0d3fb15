//! Skein Test - Shared test utilities for the skein crates.
//!
//! Mocks and fixtures used across crates as a dev-dependency.
//!
//! ```toml
//! [dev-dependencies]
//! skein-test.workspace = true
//! ```
//!
//! ```rust,ignore
//! use skein_test::{RecordingTransport, fixtures};
//!
//! let transport = RecordingTransport::new();
//! let fx = fixtures();
//! assert!(fx.registry.contains("GM.getValue"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;

/// Install a test-friendly tracing subscriber.
///
/// Honors `RUST_LOG`, defaulting to `debug`. Safe to call from every test.
pub fn init_test_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
