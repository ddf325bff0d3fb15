#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Layered configuration for skein.
//!
//! # Usage
//!
//! ```rust,no_run
//! use skein_config::Config;
//!
//! let config = Config::load(None).unwrap();
//! println!("confirm timeout: {}s", config.broker.confirm_timeout_secs);
//! ```
//!
//! # Precedence
//!
//! From highest to lowest priority:
//!
//! 1. **Environment variables** (`SKEIN_LOG_LEVEL`, `SKEIN_LOG_FORMAT`,
//!    `SKEIN_CONFIRM_TIMEOUT_SECS`, `SKEIN_CONFIRM_STREAM`)
//! 2. **Explicit file** passed to [`Config::load`]
//! 3. **User file** (`$SKEIN_HOME/config.toml`, or the platform config dir)
//! 4. **Embedded defaults** (`defaults.toml` compiled into the binary)
//!
//! This crate depends on no other skein crate. Conversion into domain types
//! happens in `skein-runtime`'s config bridge.

/// Environment variable overrides.
pub mod env;
/// Configuration error types.
pub mod error;
/// Configuration file discovery and loading.
pub mod loader;
/// TOML tree merging.
pub mod merge;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use types::*;

use std::path::Path;

impl Config {
    /// Load configuration with the full precedence chain.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any layer is malformed or the merged
    /// configuration fails validation.
    pub fn load(explicit: Option<&Path>) -> ConfigResult<Self> {
        loader::load(explicit, None)
    }

    /// Load configuration with an explicit home directory for the user layer.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any layer is malformed or the merged
    /// configuration fails validation.
    pub fn load_with_home(explicit: Option<&Path>, home: &Path) -> ConfigResult<Self> {
        loader::load(explicit, Some(home))
    }

    /// Parse a TOML document on top of the defaults, without files or env.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the document is malformed or invalid.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        loader::load_str(content)
    }
}
