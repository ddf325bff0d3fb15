//! The URL matcher: incremental `(pattern, value)` registrations.

use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use tracing::{debug, trace};
use url::Url;

use crate::host::HostNode;
use crate::pattern::{HostPattern, MatcherOptions, PathGlob, Pattern};

/// A URL-pattern registration stored in the host trie.
#[derive(Debug)]
struct PathRule<V> {
    source: Arc<str>,
    path: PathGlob,
    value: V,
}

/// A regex registration, tested against the full URL.
#[derive(Debug)]
struct RegexRule<V> {
    source: Arc<str>,
    regex: Regex,
    value: V,
}

/// Per-scheme index.
#[derive(Debug)]
struct SchemeIndex<V> {
    /// Rules whose host is `*`.
    any_host: Vec<PathRule<V>>,
    hosts: HostNode<PathRule<V>>,
}

impl<V> Default for SchemeIndex<V> {
    fn default() -> Self {
        Self {
            any_host: Vec::new(),
            hosts: HostNode::default(),
        }
    }
}

impl<V> SchemeIndex<V> {
    fn is_empty(&self) -> bool {
        self.any_host.is_empty() && self.hosts.is_empty()
    }
}

/// Bookkeeping for one registered value.
#[derive(Debug)]
struct ValueEntry {
    /// Sequence number of the value's first registration.
    order: u64,
    /// Pattern sources registered for the value, in registration order.
    patterns: Vec<Arc<str>>,
}

/// Multi-pattern URL matcher.
///
/// `add`/`delete` take `&mut self`, so mutations are serialized by the
/// borrow checker (or by [`SharedScriptMatcher`](crate::SharedScriptMatcher)
/// across threads). `match_url` takes `&self` and never mutates.
pub struct UrlMatcher<V> {
    options: MatcherOptions,
    schemes: HashMap<String, SchemeIndex<V>>,
    regexes: Vec<RegexRule<V>>,
    values: HashMap<V, ValueEntry>,
    next_order: u64,
}

impl<V> UrlMatcher<V>
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
            options,
            schemes: HashMap::new(),
            regexes: Vec::new(),
            values: HashMap::new(),
            next_order: 0,
        }
    }

    /// The options patterns are normalized with.
    #[must_use]
    pub fn options(&self) -> &MatcherOptions {
        &self.options
    }

    /// Register `value` under `pattern`.
    ///
    /// Never fails. A malformed pattern is remembered against the value (so a
    /// later [`delete`](Self::delete) is still exact) but matches nothing.
    /// Adding a pair that is already registered is a no-op.
    pub fn add(&mut self, pattern: &str, value: V) {
        let source: Arc<str> = Arc::from(pattern);

        let order = self.next_order;
        let entry = self.values.entry(value.clone()).or_insert_with(|| ValueEntry {
            order,
            patterns: Vec::new(),
        });
        if entry.patterns.iter().any(|p| **p == *pattern) {
            trace!(pattern, "pattern already registered for value");
            return;
        }
        entry.patterns.push(Arc::clone(&source));
        self.next_order = self.next_order.wrapping_add(1);

        let compiled = match Pattern::parse_with(pattern, &self.options) {
            Ok(p) => p,
            Err(e) => {
                debug!(pattern, error = %e, "ignoring malformed pattern");
                return;
            },
        };

        match compiled {
            Pattern::Regex(regex) => self.regexes.push(RegexRule {
                source,
                regex,
                value,
            }),
            Pattern::Url(url) => {
                for scheme in &url.schemes {
                    let index = self.schemes.entry(scheme.clone()).or_default();
                    let rule = PathRule {
                        source: Arc::clone(&source),
                        path: url.path.clone(),
                        value: value.clone(),
                    };
                    match &url.host {
                        HostPattern::Any => index.any_host.push(rule),
                        HostPattern::Labels(labels) => index.hosts.insert(labels, rule),
                    }
                }
            },
        }
    }

    /// Remove exactly the `(pattern, value)` registration.
    ///
    /// Other values registered on the same pattern are untouched. Deleting a
    /// pair that was never added is a no-op.
    pub fn delete(&mut self, pattern: &str, value: &V) {
        let Some(entry) = self.values.get_mut(value) else {
            return;
        };
        let Some(pos) = entry.patterns.iter().position(|p| **p == *pattern) else {
            return;
        };
        entry.patterns.remove(pos);
        if entry.patterns.is_empty() {
            self.values.remove(value);
        }

        let Ok(compiled) = Pattern::parse_with(pattern, &self.options) else {
            return;
        };
        let is_target = |source: &str, v: &V| source == pattern && v == value;

        match compiled {
            Pattern::Regex(_) => self.regexes.retain(|r| !is_target(&*r.source, &r.value)),
            Pattern::Url(url) => {
                for scheme in &url.schemes {
                    let Some(index) = self.schemes.get_mut(scheme) else {
                        continue;
                    };
                    match &url.host {
                        HostPattern::Any => index
                            .any_host
                            .retain(|r| !is_target(&*r.source, &r.value)),
                        HostPattern::Labels(labels) => {
                            let mut matches_target =
                                |r: &PathRule<V>| is_target(&r.source, &r.value);
                            index.hosts.remove_where(labels, &mut matches_target);
                        },
                    }
                    if index.is_empty() {
                        self.schemes.remove(scheme);
                    }
                }
            },
        }
    }

    /// Remove every registration for `value`.
    pub fn delete_value(&mut self, value: &V) {
        let patterns = self
            .values
            .get(value)
            .map(|e| e.patterns.clone())
            .unwrap_or_default();
        for pattern in patterns {
            self.delete(&pattern, value);
        }
    }

    /// Values whose patterns match `url`.
    ///
    /// Ordered by the value's first registration, each value at most once.
    /// An unparseable URL matches nothing.
    #[must_use]
    pub fn match_url(&self, url: &str) -> Vec<V> {
        let Ok(parsed) = Url::parse(url) else {
            trace!(url, "unparseable url, no matches");
            return Vec::new();
        };

        let mut hits: Vec<&V> = Vec::new();

        if let Some(index) = self.schemes.get(parsed.scheme()) {
            let path = match parsed.query() {
                Some(q) => format!("{}?{q}", parsed.path()),
                None => parsed.path().to_owned(),
            };
            let host = parsed
                .host_str()
                .unwrap_or_default()
                .trim_end_matches('.')
                .to_ascii_lowercase();
            let labels: Vec<&str> = if host.is_empty() {
                Vec::new()
            } else {
                host.split('.').rev().collect()
            };

            let mut candidates: Vec<&PathRule<V>> = index.any_host.iter().collect();
            index.hosts.collect(&labels, &mut candidates);
            hits.extend(
                candidates
                    .into_iter()
                    .filter(|r| r.path.is_match(&path))
                    .map(|r| &r.value),
            );
        }

        let full = parsed.as_str();
        hits.extend(
            self.regexes
                .iter()
                .filter(|r| r.regex.is_match(full))
                .map(|r| &r.value),
        );

        let mut seen = HashSet::new();
        hits.retain(|v| seen.insert(*v));
        hits.sort_by_key(|v| self.values.get(*v).map_or(u64::MAX, |e| e.order));
        hits.into_iter().cloned().collect()
    }

    /// Whether any registration matches `url`.
    #[must_use]
    pub fn is_match(&self, url: &str) -> bool {
        !self.match_url(url).is_empty()
    }

    /// Pattern sources registered for `value`, in registration order.
    #[must_use]
    pub fn patterns_for(&self, value: &V) -> Vec<String> {
        self.values
            .get(value)
            .map(|e| e.patterns.iter().map(ToString::to_string).collect())
            .unwrap_or_default()
    }

    /// Whether `value` has any registration.
    #[must_use]
    pub fn contains_value(&self, value: &V) -> bool {
        self.values.contains_key(value)
    }

    /// Number of `(pattern, value)` registrations, malformed ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.values().map(|e| e.patterns.len()).sum()
    }

    /// Whether there are no registrations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<V> Default for UrlMatcher<V>
where
    V: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for UrlMatcher<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlMatcher")
            .field("values", &self.values.len())
            .field("schemes", &self.schemes.len())
            .field("regexes", &self.regexes.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "matcher_tests.rs"]
mod tests;
