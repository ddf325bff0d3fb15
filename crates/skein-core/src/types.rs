//! Shared identifier and scheduling types.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};

/// Namespace used to derive stable script identifiers from a name + namespace pair.
const SCRIPT_NAMESPACE: Uuid = Uuid::from_u128(0x6a1f_3c52_8d0e_4b7a_9f21_5e6c_d4b3_a7e8);

/// Unique identifier for an installed userscript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScriptId(pub Uuid);

impl ScriptId {
    /// Create a new random script ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Derive a stable ID from a script's `@namespace` and `@name`.
    ///
    /// Reinstalling the same script yields the same ID, so cached
    /// confirmation decisions survive an update.
    #[must_use]
    pub fn derive(namespace: &str, name: &str) -> Self {
        let key = format!("{namespace}\n{name}");
        Self(Uuid::new_v5(&SCRIPT_NAMESPACE, key.as_bytes()))
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for ScriptId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ScriptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "script:{}", self.0)
    }
}

impl FromStr for ScriptId {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        let raw = s.strip_prefix("script:").unwrap_or(s);
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| CoreError::InvalidScriptId(s.to_owned()))
    }
}

/// The point in page load at which a script is injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunAt {
    /// Before any page script runs. The host transport may not be ready yet.
    DocumentStart,
    /// As soon as `<body>` exists.
    DocumentBody,
    /// After the DOM is parsed.
    DocumentEnd,
    /// After the page has settled.
    #[default]
    DocumentIdle,
    /// Only when invoked from the context menu.
    ContextMenu,
}

impl RunAt {
    /// All injection points in page-load order.
    pub const ALL: [Self; 5] = [
        Self::DocumentStart,
        Self::DocumentBody,
        Self::DocumentEnd,
        Self::DocumentIdle,
        Self::ContextMenu,
    ];

    /// The metadata spelling of this value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DocumentStart => "document-start",
            Self::DocumentBody => "document-body",
            Self::DocumentEnd => "document-end",
            Self::DocumentIdle => "document-idle",
            Self::ContextMenu => "context-menu",
        }
    }

    /// Whether scripts at this point can run before the transport is negotiated.
    #[must_use]
    pub fn is_early(self) -> bool {
        matches!(self, Self::DocumentStart | Self::DocumentBody)
    }
}

impl fmt::Display for RunAt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunAt {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == s.trim())
            .ok_or_else(|| CoreError::UnknownRunAt(s.to_owned()))
    }
}

/// A UTC timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub DateTime<Utc>);

impl Timestamp {
    /// The current time.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// A timestamp `secs` seconds from now. Saturates at the far future.
    #[must_use]
    pub fn in_secs(secs: u64) -> Self {
        let delta = i64::try_from(secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX);
        Self(Utc::now().checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC))
    }

    /// Whether this timestamp lies in the past.
    #[must_use]
    pub fn is_past(&self) -> bool {
        self.0 < Utc::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_id_display_and_parse() {
        let id = ScriptId::new();
        let shown = id.to_string();
        assert!(shown.starts_with("script:"));
        assert_eq!(shown.parse::<ScriptId>().unwrap(), id);
        assert_eq!(id.0.to_string().parse::<ScriptId>().unwrap(), id);
    }

    #[test]
    fn test_script_id_parse_rejects_garbage() {
        assert!("script:not-a-uuid".parse::<ScriptId>().is_err());
    }

    #[test]
    fn test_script_id_derive_is_stable() {
        let a = ScriptId::derive("https://example.com", "Dark Mode");
        let b = ScriptId::derive("https://example.com", "Dark Mode");
        let c = ScriptId::derive("https://example.com", "Light Mode");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_run_at_round_trip_spelling() {
        for run_at in RunAt::ALL {
            assert_eq!(run_at.as_str().parse::<RunAt>().unwrap(), run_at);
        }
        assert!("document-whenever".parse::<RunAt>().is_err());
        assert_eq!(RunAt::default(), RunAt::DocumentIdle);
    }

    #[test]
    fn test_run_at_serde_kebab_case() {
        let json = serde_json::to_string(&RunAt::DocumentStart).unwrap();
        assert_eq!(json, "\"document-start\"");
        assert!(RunAt::DocumentStart.is_early());
        assert!(!RunAt::DocumentEnd.is_early());
    }

    #[test]
    fn test_timestamp_expiry() {
        assert!(!Timestamp::in_secs(60).is_past());
        let past = Timestamp(Utc::now() - Duration::seconds(5));
        assert!(past.is_past());
        // Huge values saturate rather than overflow
        assert!(!Timestamp::in_secs(u64::MAX).is_past());
    }
}
