//! Thread-safe handle over a [`ScriptMatcher`].

use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::pattern::MatcherOptions;
use crate::script::{PatternKind, PatternSet, ScriptMatcher};

/// Shared, cloneable matcher.
///
/// Install and uninstall paths take the write lock, so `add`/`delete` are
/// serialized against each other. Lookups take the read lock and may run
/// concurrently with one another.
pub struct SharedScriptMatcher<V> {
    inner: Arc<RwLock<ScriptMatcher<V>>>,
}

impl<V> SharedScriptMatcher<V>
where
    V: Clone + Eq + Hash,
{
    /// Create an empty shared matcher.
    #[must_use]
    pub fn new(options: MatcherOptions) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ScriptMatcher::with_options(options))),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, ScriptMatcher<V>> {
        self.inner.read().unwrap_or_else(|e| {
            tracing::warn!("matcher read lock poisoned, recovering");
            e.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, ScriptMatcher<V>> {
        self.inner.write().unwrap_or_else(|e| {
            tracing::warn!("matcher write lock poisoned, recovering");
            e.into_inner()
        })
    }

    /// Register a single pattern.
    pub fn add(&self, kind: PatternKind, pattern: &str, value: V) {
        self.write().add(kind, pattern, value);
    }

    /// Remove a single pattern.
    pub fn delete(&self, kind: PatternKind, pattern: &str, value: &V) {
        self.write().delete(kind, pattern, value);
    }

    /// Register a whole pattern set atomically.
    pub fn register(&self, value: &V, set: &PatternSet) {
        self.write().register(value, set);
    }

    /// Replace a value's patterns atomically.
    ///
    /// Readers never observe the value half-registered.
    pub fn replace(&self, value: &V, set: &PatternSet) {
        let mut guard = self.write();
        guard.unregister(value);
        guard.register(value, set);
    }

    /// Remove every registration for `value`.
    pub fn unregister(&self, value: &V) {
        self.write().unregister(value);
    }

    /// Values matching `url`.
    #[must_use]
    pub fn match_url(&self, url: &str) -> Vec<V> {
        self.read().match_url(url)
    }

    /// Whether `value` has a positive registration.
    #[must_use]
    pub fn contains(&self, value: &V) -> bool {
        self.read().contains(value)
    }
}

impl<V> Clone for SharedScriptMatcher<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> Default for SharedScriptMatcher<V>
where
    V: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new(MatcherOptions::default())
    }
}

impl<V> fmt::Debug for SharedScriptMatcher<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedScriptMatcher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_clones_share_state() {
        let a: SharedScriptMatcher<u32> = SharedScriptMatcher::default();
        let b = a.clone();
        a.add(PatternKind::Match, "example.com", 1);
        assert_eq!(b.match_url("https://example.com/"), vec![1]);
    }

    #[test]
    fn test_replace_swaps_patterns() {
        let m = SharedScriptMatcher::default();
        m.register(&1, &PatternSet::new().with_match("a.com"));
        m.replace(&1, &PatternSet::new().with_match("b.com"));
        assert!(m.match_url("https://a.com/").is_empty());
        assert_eq!(m.match_url("https://b.com/"), vec![1]);
    }

    #[test]
    fn test_concurrent_writers_and_readers() {
        let m: SharedScriptMatcher<u32> = SharedScriptMatcher::default();
        let handles: Vec<_> = (0..8u32)
            .map(|i| {
                let m = m.clone();
                thread::spawn(move || {
                    m.add(PatternKind::Match, "*://*.example.com/*", i);
                    let _ = m.match_url("https://www.example.com/");
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let mut all = m.match_url("https://www.example.com/");
        all.sort_unstable();
        assert_eq!(all, (0..8).collect::<Vec<_>>());
    }
}
