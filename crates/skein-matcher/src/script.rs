//! Script-level matching with `@match`, `@include` and `@exclude`.

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use tracing::debug;

use crate::matcher::UrlMatcher;
use crate::pattern::MatcherOptions;

/// Which metadata key a pattern was declared under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternKind {
    /// `@match`.
    Match,
    /// `@include`.
    Include,
    /// `@exclude`.
    Exclude,
}

/// The patterns one script declares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternSet {
    /// `@match` patterns.
    pub matches: Vec<String>,
    /// `@include` patterns.
    pub includes: Vec<String>,
    /// `@exclude` patterns.
    pub excludes: Vec<String>,
}

impl PatternSet {
    /// Create an empty pattern set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
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

    /// Iterate every pattern with its kind, in declaration order per kind.
    pub fn iter(&self) -> impl Iterator<Item = (PatternKind, &str)> {
        let m = self.matches.iter().map(|p| (PatternKind::Match, p.as_str()));
        let i = self.includes.iter().map(|p| (PatternKind::Include, p.as_str()));
        let e = self.excludes.iter().map(|p| (PatternKind::Exclude, p.as_str()));
        m.chain(i).chain(e)
    }

    /// Whether the set declares no positive pattern.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty() && self.includes.is_empty()
    }
}

/// Combines positive patterns with exclusions.
///
/// `@match` and `@include` registrations are unioned; `@exclude` is applied
/// afterwards as a final filter, so the declaration order of excludes
/// relative to includes never matters.
pub struct ScriptMatcher<V> {
    positive: UrlMatcher<V>,
    excludes: UrlMatcher<V>,
}

impl<V> ScriptMatcher<V>
where
    V: Clone + Eq + Hash,
{
    /// Create an empty matcher with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(MatcherOptions::default())
    }

    /// Create an empty matcher with explicit options.
    #[must_use]
    pub fn with_options(options: MatcherOptions) -> Self {
        Self {
            positive: UrlMatcher::with_options(options.clone()),
            excludes: UrlMatcher::with_options(options),
        }
    }

    /// Register a single pattern of the given kind.
    pub fn add(&mut self, kind: PatternKind, pattern: &str, value: V) {
        match kind {
            PatternKind::Match | PatternKind::Include => self.positive.add(pattern, value),
            PatternKind::Exclude => self.excludes.add(pattern, value),
        }
    }

    /// Remove a single pattern of the given kind.
    pub fn delete(&mut self, kind: PatternKind, pattern: &str, value: &V) {
        match kind {
            PatternKind::Match | PatternKind::Include => self.positive.delete(pattern, value),
            PatternKind::Exclude => self.excludes.delete(pattern, value),
        }
    }

    /// Register a `@match` pattern.
    pub fn add_match(&mut self, pattern: &str, value: V) {
        self.add(PatternKind::Match, pattern, value);
    }

    /// Register an `@include` pattern.
    pub fn add_include(&mut self, pattern: &str, value: V) {
        self.add(PatternKind::Include, pattern, value);
    }

    /// Register an `@exclude` pattern.
    pub fn add_exclude(&mut self, pattern: &str, value: V) {
        self.add(PatternKind::Exclude, pattern, value);
    }

    /// Register every pattern of `set` for `value`.
    pub fn register(&mut self, value: &V, set: &PatternSet) {
        for (kind, pattern) in set.iter() {
            self.add(kind, pattern, value.clone());
        }
        debug!(
            matches = set.matches.len(),
            includes = set.includes.len(),
            excludes = set.excludes.len(),
            "registered pattern set"
        );
    }

    /// Remove every registration for `value`.
    pub fn unregister(&mut self, value: &V) {
        self.positive.delete_value(value);
        self.excludes.delete_value(value);
    }

    /// Values whose positive patterns match `url` and no exclude does.
    #[must_use]
    pub fn match_url(&self, url: &str) -> Vec<V> {
        let mut matched = self.positive.match_url(url);
        if matched.is_empty() || self.excludes.is_empty() {
            return matched;
        }
        let excluded: HashSet<V> = self.excludes.match_url(url).into_iter().collect();
        matched.retain(|v| !excluded.contains(v));
        matched
    }

    /// Whether `value` has at least one positive registration.
    #[must_use]
    pub fn contains(&self, value: &V) -> bool {
        self.positive.contains_value(value)
    }

    /// The positive-pattern matcher.
    #[must_use]
    pub fn positive(&self) -> &UrlMatcher<V> {
        &self.positive
    }

    /// The exclude-pattern matcher.
    #[must_use]
    pub fn excludes(&self) -> &UrlMatcher<V> {
        &self.excludes
    }
}

impl<V> Default for ScriptMatcher<V>
where
    V: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for ScriptMatcher<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptMatcher")
            .field("positive", &self.positive)
            .field("excludes", &self.excludes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exclude_suppresses_match() {
        let mut m = ScriptMatcher::new();
        m.add_match("*://*.example.com/*", "s");
        m.add_exclude("*://admin.example.com/*", "s");

        assert_eq!(m.match_url("https://www.example.com/"), vec!["s"]);
        assert!(m.match_url("https://admin.example.com/panel").is_empty());
    }

    #[test]
    fn test_exclude_order_does_not_matter() {
        let mut before = ScriptMatcher::new();
        before.add_exclude("*://example.com/private/*", 1);
        before.add_match("*://example.com/*", 1);

        let mut after = ScriptMatcher::new();
        after.add_match("*://example.com/*", 1);
        after.add_exclude("*://example.com/private/*", 1);

        for url in ["https://example.com/", "https://example.com/private/x"] {
            assert_eq!(before.match_url(url), after.match_url(url));
        }
        assert!(before.match_url("https://example.com/private/x").is_empty());
    }

    #[test]
    fn test_exclude_wins_over_many_includes() {
        let set = PatternSet::new()
            .with_match("*://example.com/*")
            .with_include("example.com")
            .with_include(r"/example\.com/")
            .with_exclude("*://example.com/logout");
        let mut m = ScriptMatcher::new();
        m.register(&"s", &set);
        assert!(m.match_url("https://example.com/logout").is_empty());
        assert_eq!(m.match_url("https://example.com/home"), vec!["s"]);
    }

    #[test]
    fn test_exclude_only_affects_its_own_value() {
        let mut m = ScriptMatcher::new();
        m.add_match("*://example.com/*", "a");
        m.add_match("*://example.com/*", "b");
        m.add_exclude("*://example.com/*", "a");
        assert_eq!(m.match_url("https://example.com/"), vec!["b"]);
    }

    #[test]
    fn test_unregister_removes_everything() {
        let set = PatternSet::new()
            .with_match("*://example.com/*")
            .with_exclude("*://example.com/x");
        let mut m = ScriptMatcher::new();
        m.register(&"a", &set);
        assert!(m.contains(&"a"));

        m.unregister(&"a");
        assert!(!m.contains(&"a"));
        assert!(m.positive().is_empty());
        assert!(m.excludes().is_empty());
    }

    #[test]
    fn test_delete_single_exclude_restores_match() {
        let mut m = ScriptMatcher::new();
        m.add_include("example.com", "a");
        m.add_exclude("*://example.com/*", "a");
        assert!(m.match_url("https://example.com/").is_empty());

        m.delete(PatternKind::Exclude, "*://example.com/*", &"a");
        assert_eq!(m.match_url("https://example.com/"), vec!["a"]);
    }

    #[test]
    fn test_pattern_set_iter_and_empty() {
        let set = PatternSet::new().with_exclude("a.com");
        assert!(set.is_empty());
        let kinds: Vec<PatternKind> = set.iter().map(|(k, _)| k).collect();
        assert_eq!(kinds, vec![PatternKind::Exclude]);
    }
}
