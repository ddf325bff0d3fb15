use std::collections::HashMap;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::merge::set_path;

/// Directory holding the user config file.
pub const ENV_HOME: &str = "SKEIN_HOME";

/// Prefix every recognised variable shares.
const ENV_PREFIX: &str = "SKEIN_";

#[derive(Clone, Copy)]
enum Kind {
    String,
    Integer,
}

/// `(variable, dotted config path, value kind)`.
const OVERRIDES: &[(&str, &str, Kind)] = &[
    ("SKEIN_LOG_LEVEL", "logging.level", Kind::String),
    ("SKEIN_LOG_FORMAT", "logging.format", Kind::String),
    ("SKEIN_LOG_DIR", "logging.directory", Kind::String),
    ("SKEIN_CONFIRM_TIMEOUT_SECS", "broker.confirm_timeout_secs", Kind::Integer),
    ("SKEIN_CONFIRM_STREAM", "channel.confirm_stream", Kind::String),
];

/// Snapshot the `SKEIN_*` variables of the current process.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars()
        .filter(|(k, _)| k.starts_with(ENV_PREFIX))
        .collect()
}

/// Write recognised variables from `vars` into the merged tree.
///
/// Returns how many overrides were applied.
///
/// # Errors
///
/// Returns [`ConfigError::EnvError`] if an integer variable does not parse.
pub fn apply_env_overrides(
    root: &mut toml::Value,
    vars: &HashMap<String, String>,
) -> ConfigResult<usize> {
    let mut applied = 0usize;
    for &(var, path, kind) in OVERRIDES {
        let Some(raw) = vars.get(var) else {
            continue;
        };
        let value = match kind {
            Kind::String => toml::Value::String(raw.clone()),
            Kind::Integer => {
                let n: i64 = raw.trim().parse().map_err(|_| ConfigError::EnvError {
                    var: var.to_owned(),
                    message: format!("expected an integer, got '{raw}'"),
                })?;
                toml::Value::Integer(n)
            },
        };
        debug!(var, path, "applying environment override");
        set_path(root, path, value);
        applied = applied.saturating_add(1);
    }
    Ok(applied)
}
