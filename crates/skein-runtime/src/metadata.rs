//! Installed script metadata.

use serde::{Deserialize, Serialize};
use skein_core::{RunAt, ScriptId};
use skein_matcher::PatternSet;

/// The parts of a userscript header the core acts on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptMetadata {
    /// Script identifier.
    pub id: ScriptId,
    /// `@name`.
    pub name: String,
    /// `@match` patterns.
    #[serde(default)]
    pub matches: Vec<String>,
    /// `@include` patterns.
    #[serde(default)]
    pub includes: Vec<String>,
    /// `@exclude` patterns.
    #[serde(default)]
    pub excludes: Vec<String>,
    /// `@grant` names, in declaration order.
    #[serde(default)]
    pub grants: Vec<String>,
    /// `@run-at`.
    #[serde(default)]
    pub run_at: RunAt,
    /// Whether the script is enabled.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl ScriptMetadata {
    /// Enabled metadata with no patterns or grants, running at `document-idle`.
    #[must_use]
    pub fn new(id: ScriptId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            matches: Vec::new(),
            includes: Vec::new(),
            excludes: Vec::new(),
            grants: Vec::new(),
            run_at: RunAt::default(),
            enabled: true,
        }
    }

    /// Add a `@match` pattern.
    #[must_use]
    pub fn with_match(mut self, pattern: impl Into<String>) -> Self {
        self.matches.push(pattern.into());
        self
    }

    /// Add an `@include` pattern.
    #[must_use]
    pub fn with_include(mut self, pattern: impl Into<String>) -> Self {
        self.includes.push(pattern.into());
        self
    }

    /// Add an `@exclude` pattern.
    #[must_use]
    pub fn with_exclude(mut self, pattern: impl Into<String>) -> Self {
        self.excludes.push(pattern.into());
        self
    }

    /// Add a `@grant`.
    #[must_use]
    pub fn with_grant(mut self, grant: impl Into<String>) -> Self {
        self.grants.push(grant.into());
        self
    }

    /// Set `@run-at`.
    #[must_use]
    pub fn with_run_at(mut self, run_at: RunAt) -> Self {
        self.run_at = run_at;
        self
    }

    /// Mark the script disabled.
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// The script's patterns as a matcher registration.
    #[must_use]
    pub fn pattern_set(&self) -> PatternSet {
        PatternSet {
            matches: self.matches.clone(),
            includes: self.includes.clone(),
            excludes: self.excludes.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_pattern_set() {
        let meta = ScriptMetadata::new(ScriptId::new(), "demo")
            .with_match("*://example.com/*")
            .with_include("example.org")
            .with_exclude("*://example.com/admin/*")
            .with_grant("GM_setValue")
            .with_run_at(RunAt::DocumentStart);

        let set = meta.pattern_set();
        assert_eq!(set.matches, vec!["*://example.com/*"]);
        assert_eq!(set.includes, vec!["example.org"]);
        assert_eq!(set.excludes, vec!["*://example.com/admin/*"]);
        assert!(meta.enabled);
        assert!(!meta.clone().disabled().enabled);
    }

    #[test]
    fn test_deserialize_defaults() {
        let id = ScriptId::new();
        let json = serde_json::json!({"id": id, "name": "bare", "run_at": "document-end"});
        let meta: ScriptMetadata = serde_json::from_value(json).unwrap();
        assert_eq!(meta.id, id);
        assert_eq!(meta.run_at, RunAt::DocumentEnd);
        assert!(meta.enabled);
        assert!(meta.grants.is_empty());
    }
}
