//! Bridge from `skein_config::Config` to domain types.
//!
//! The config crate has no dependencies on other internal crates. This
//! module translates its sections into the option types the matcher,
//! channel, broker, and telemetry crates take.

use std::sync::Arc;
use std::time::Duration;

use skein_approval::{BrokerOptions, PermissionBroker};
use skein_capabilities::CapabilityRegistry;
use skein_config::Config;
use skein_events::{DeliveryChannel, Transport};
use skein_matcher::MatcherOptions;
use skein_telemetry::{LogConfig, TelemetryResult};

use crate::manager::ScriptManager;

/// Convert config to [`MatcherOptions`].
#[must_use]
pub fn to_matcher_options(cfg: &Config) -> MatcherOptions {
    MatcherOptions {
        wildcard_schemes: cfg.matcher.wildcard_scheme_expands_to.clone(),
        missing_path_is_wildcard: cfg.matcher.missing_path_is_wildcard,
    }
}

/// Convert config to [`BrokerOptions`].
#[must_use]
pub fn to_broker_options(cfg: &Config) -> BrokerOptions {
    BrokerOptions {
        confirm_stream: cfg.channel.confirm_stream.clone(),
        timeout: Duration::from_secs(cfg.broker.confirm_timeout_secs),
        cache_ttl: cfg.broker.cache_ttl_secs.map(Duration::from_secs),
    }
}

/// Build a [`DeliveryChannel`], optionally with a default transport.
#[must_use]
pub fn to_delivery_channel(cfg: &Config, transport: Option<Arc<dyn Transport>>) -> DeliveryChannel {
    let channel = match transport {
        Some(transport) => DeliveryChannel::new(transport),
        None => DeliveryChannel::unbound(),
    };
    channel.with_buffer_warn_threshold(cfg.channel.buffer_warn_threshold)
}

/// Convert config to [`LogConfig`].
///
/// # Errors
///
/// Returns an error if the configured log format is unknown.
pub fn to_log_config(cfg: &Config) -> TelemetryResult<LogConfig> {
    LogConfig::from_section(&cfg.logging)
}

impl ScriptManager {
    /// Build a manager, and the broker it uses, from config.
    #[must_use]
    pub fn from_config(
        cfg: &Config,
        registry: Arc<CapabilityRegistry>,
        channel: Arc<DeliveryChannel>,
    ) -> Self {
        let broker = PermissionBroker::with_options(channel, to_broker_options(cfg));
        Self::with_options(registry, Arc::new(broker), to_matcher_options(cfg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skein_core::RunAt;
    use skein_events::StreamState;
    use skein_telemetry::{LogFormat, LogTarget};
    use std::path::PathBuf;
    use skein_test::{RecordingTransport, fixture_registry, test_script_id};

    use crate::metadata::ScriptMetadata;

    fn config(toml: &str) -> Config {
        Config::from_toml_str(toml).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        let matcher = to_matcher_options(&cfg);
        assert_eq!(matcher.wildcard_schemes, vec!["http", "https"]);
        assert!(matcher.missing_path_is_wildcard);

        let broker = to_broker_options(&cfg);
        assert_eq!(broker, BrokerOptions::default());
    }

    #[test]
    fn test_overrides() {
        let cfg = config(
            r#"
            [matcher]
            wildcard_scheme_expands_to = ["https"]

            [channel]
            confirm_stream = "host.confirm"
            buffer_warn_threshold = 8

            [broker]
            confirm_timeout_secs = 30
            cache_ttl_secs = 600

            [logging]
            level = "debug"
            format = "json"
            "#,
        );

        let broker = to_broker_options(&cfg);
        assert_eq!(broker.confirm_stream, "host.confirm");
        assert_eq!(broker.timeout, Duration::from_secs(30));
        assert_eq!(broker.cache_ttl, Some(Duration::from_secs(600)));

        let log = to_log_config(&cfg).unwrap();
        assert_eq!(log.level, "debug");
        assert_eq!(log.format, LogFormat::Json);
    }

    #[test]
    fn test_log_directory_selects_file_target() {
        assert_eq!(to_log_config(&Config::default()).unwrap().target, LogTarget::Stderr);

        let cfg = config("[logging]\ndirectory = \"/tmp/skein-logs\"\n");
        let log = to_log_config(&cfg).unwrap();
        assert_eq!(log.target, LogTarget::File(PathBuf::from("/tmp/skein-logs")));
        assert!(!log.ansi);
    }

    #[test]
    fn test_delivery_channel_from_config() {
        let cfg = Config::default();
        let recorder = RecordingTransport::new();
        let channel = to_delivery_channel(&cfg, Some(Arc::new(recorder.clone())));
        channel.dispatch("s", serde_json::json!(1));
        assert_eq!(channel.bind("s").unwrap(), 1);
        assert_eq!(channel.state("s"), StreamState::Bound);
        assert_eq!(recorder.len(), 1);

        let unbound = to_delivery_channel(&cfg, None);
        assert!(unbound.bind("s").is_err());
    }

    #[test]
    fn test_manager_from_config_uses_matcher_options() {
        let cfg = config("[matcher]\nwildcard_scheme_expands_to = [\"https\"]\n");
        let channel = Arc::new(to_delivery_channel(&cfg, None));
        let manager = ScriptManager::from_config(&cfg, fixture_registry(), channel);

        let id = test_script_id("https-only");
        manager.install(ScriptMetadata::new(id, "https-only").with_match("*://example.com/*"));
        assert_eq!(manager.scripts_for("https://example.com/", RunAt::DocumentIdle), vec![id]);
        assert!(manager.scripts_for("http://example.com/", RunAt::DocumentIdle).is_empty());
    }
}
