//! Configuration types.
//!
//! Every struct implements [`Default`] with the same values as the embedded
//! `defaults.toml`, so a bare `[section]` header yields a working section.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// URL pattern compilation.
    pub matcher: MatcherSection,
    /// Message delivery channel.
    pub channel: ChannelSection,
    /// Permission broker.
    pub broker: BrokerSection,
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
}

/// Pattern matcher settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherSection {
    /// Schemes a `*` scheme expands to.
    pub wildcard_scheme_expands_to: Vec<String>,
    /// Whether a pattern without a path matches every path.
    pub missing_path_is_wildcard: bool,
}

impl Default for MatcherSection {
    fn default() -> Self {
        Self {
            wildcard_scheme_expands_to: vec!["http".to_owned(), "https".to_owned()],
            missing_path_is_wildcard: true,
        }
    }
}

/// Delivery channel settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelSection {
    /// Stream confirmation requests are sent on.
    pub confirm_stream: String,
    /// Buffered-message interval between warnings. Zero disables them.
    pub buffer_warn_threshold: usize,
}

impl Default for ChannelSection {
    fn default() -> Self {
        Self {
            confirm_stream: "skein.permission.confirm".to_owned(),
            buffer_warn_threshold: 1024,
        }
    }
}

/// Permission broker settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerSection {
    /// Seconds to wait for a user answer before denying.
    pub confirm_timeout_secs: u64,
    /// Expiry for session-scoped decisions. Unset keeps them until restart.
    pub cache_ttl_secs: Option<u64>,
}

impl Default for BrokerSection {
    fn default() -> Self {
        Self {
            confirm_timeout_secs: 300,
            cache_ttl_secs: None,
        }
    }
}

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"`, or `"full"`.
    pub format: String,
    /// Per-crate tracing directives (e.g. `["skein_matcher=debug"]`).
    pub directives: Vec<String>,
    /// Write daily-rotated log files here instead of stderr.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
            directory: None,
        }
    }
}
