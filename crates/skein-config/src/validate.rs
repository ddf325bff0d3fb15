use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: [&str; 4] = ["pretty", "compact", "json", "full"];

/// Validate a fully-merged configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_matcher(config)?;
    validate_channel(config)?;
    validate_broker(config)?;
    validate_logging(config)?;
    Ok(())
}

fn invalid(field: &str, message: String) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_owned(),
        message,
    }
}

fn validate_matcher(config: &Config) -> ConfigResult<()> {
    let schemes = &config.matcher.wildcard_scheme_expands_to;
    if schemes.is_empty() {
        return Err(invalid(
            "matcher.wildcard_scheme_expands_to",
            "at least one scheme is required".to_owned(),
        ));
    }
    for scheme in schemes {
        let valid = scheme.chars().next().is_some_and(|c| c.is_ascii_lowercase())
            && scheme.chars().all(|c| {
                c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '+' | '-' | '.')
            });
        if !valid {
            return Err(invalid(
                "matcher.wildcard_scheme_expands_to",
                format!("'{scheme}' is not a lowercase URL scheme"),
            ));
        }
    }
    Ok(())
}

fn validate_channel(config: &Config) -> ConfigResult<()> {
    if config.channel.confirm_stream.trim().is_empty() {
        return Err(invalid(
            "channel.confirm_stream",
            "stream name must not be empty".to_owned(),
        ));
    }
    Ok(())
}

fn validate_broker(config: &Config) -> ConfigResult<()> {
    if config.broker.confirm_timeout_secs == 0 {
        return Err(invalid(
            "broker.confirm_timeout_secs",
            "timeout must be greater than zero".to_owned(),
        ));
    }
    if config.broker.cache_ttl_secs == Some(0) {
        return Err(invalid(
            "broker.cache_ttl_secs",
            "ttl must be greater than zero; omit it to keep decisions for the session".to_owned(),
        ));
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    if !LOG_LEVELS.contains(&config.logging.level.as_str()) {
        return Err(invalid(
            "logging.level",
            format!(
                "unsupported log level '{}'; expected one of: {}",
                config.logging.level,
                LOG_LEVELS.join(", ")
            ),
        ));
    }
    if !LOG_FORMATS.contains(&config.logging.format.as_str()) {
        return Err(invalid(
            "logging.format",
            format!(
                "unsupported log format '{}'; expected one of: {}",
                config.logging.format,
                LOG_FORMATS.join(", ")
            ),
        ));
    }
    Ok(())
}
