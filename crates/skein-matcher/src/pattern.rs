//! Pattern parsing and normalization.

use regex::{Regex, RegexBuilder};
use std::fmt;
use url::{Host, Url};

use crate::error::{MatcherError, MatcherResult};

/// Schemes a scheme glob such as `http*` is expanded against.
const KNOWN_SCHEMES: &[&str] = &["http", "https", "file", "ftp", "ws", "wss"];

/// Token that matches every URL the manager can inject into.
const ALL_URLS: &str = "<all_urls>";

/// Origin used to run pattern paths through the URL serializer.
const PATH_ORIGIN: &str = "http://path.invalid";

/// Knobs that affect how pattern sources are normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatcherOptions {
    /// Schemes that a `*` scheme stands for.
    pub wildcard_schemes: Vec<String>,
    /// Treat `https://example.com` (no path) as `https://example.com/*`
    /// instead of `https://example.com/`.
    pub missing_path_is_wildcard: bool,
}

impl Default for MatcherOptions {
    fn default() -> Self {
        Self {
            wildcard_schemes: vec!["http".to_owned(), "https".to_owned()],
            missing_path_is_wildcard: true,
        }
    }
}

/// A compiled pattern. Immutable once built.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// A `scheme://host/path` (or bare-domain) pattern.
    Url(UrlPattern),
    /// A regular expression tested against the whole URL.
    Regex(Regex),
}

/// The normalized form of a URL pattern.
#[derive(Debug, Clone)]
pub struct UrlPattern {
    /// Concrete schemes this pattern is registered under.
    pub schemes: Vec<String>,
    /// Host constraint.
    pub host: HostPattern,
    /// Compiled path glob.
    pub path: PathGlob,
}

/// Host constraint of a URL pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostPattern {
    /// Any host, including the empty host of `file://` URLs.
    Any,
    /// Host labels in reversed order (TLD first).
    Labels(Vec<HostLabel>),
}

/// One label of a host pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HostLabel {
    /// A literal, lowercased label.
    Exact(String),
    /// A whole-label `*`.
    Wildcard,
}

/// A path glob compiled to an anchored regular expression.
#[derive(Clone)]
pub struct PathGlob {
    source: String,
    regex: Regex,
}

impl PathGlob {
    /// Compile a glob where `*` matches any run of characters.
    ///
    /// # Errors
    ///
    /// Returns the regex error if the translated expression fails to build,
    /// which in practice only happens for pathologically large globs.
    pub fn compile(glob: &str) -> Result<Self, regex::Error> {
        let mut expr = String::with_capacity(glob.len().saturating_add(8));
        expr.push('^');
        for (i, part) in glob.split('*').enumerate() {
            if i > 0 {
                expr.push_str(".*");
            }
            expr.push_str(&regex::escape(part));
        }
        expr.push('$');
        Ok(Self {
            source: glob.to_owned(),
            regex: Regex::new(&expr)?,
        })
    }

    /// The original glob text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Test a path (plus query string) against this glob.
    #[must_use]
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }
}

impl fmt::Debug for PathGlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PathGlob").field(&self.source).finish()
    }
}

impl Pattern {
    /// Parse a pattern source with default options.
    ///
    /// # Errors
    ///
    /// See [`Pattern::parse_with`].
    pub fn parse(source: &str) -> MatcherResult<Self> {
        Self::parse_with(source, &MatcherOptions::default())
    }

    /// Parse a pattern source.
    ///
    /// # Errors
    ///
    /// Returns a [`MatcherError`] describing the first problem found. The
    /// matchers treat any error as "this pattern matches nothing".
    pub fn parse_with(source: &str, options: &MatcherOptions) -> MatcherResult<Self> {
        let trimmed = source.trim();
        if trimmed.is_empty() {
            return Err(MatcherError::Empty);
        }

        if trimmed == ALL_URLS || trimmed == "*" {
            let mut schemes = options.wildcard_schemes.clone();
            if !schemes.iter().any(|s| s == "file") {
                schemes.push("file".to_owned());
            }
            return Ok(Self::Url(UrlPattern {
                schemes,
                host: HostPattern::Any,
                path: compile_path(source, "/*")?,
            }));
        }

        if let Some((body, insensitive)) = regex_body(trimmed) {
            let regex = RegexBuilder::new(body)
                .case_insensitive(insensitive)
                .build()
                .map_err(|e| MatcherError::InvalidRegex {
                    pattern: source.to_owned(),
                    source: e,
                })?;
            return Ok(Self::Regex(regex));
        }

        let (schemes, rest) = match trimmed.split_once("://") {
            Some((scheme, rest)) => (expand_scheme(source, scheme, options)?, rest),
            // A plain string is a literal domain, optionally with a path.
            None => (options.wildcard_schemes.clone(), trimmed),
        };

        let (host_part, path_part) = match rest.find('/') {
            Some(idx) => rest.split_at(idx),
            None => (rest, ""),
        };

        let path = if path_part.is_empty() {
            if options.missing_path_is_wildcard {
                "/*"
            } else {
                "/"
            }
        } else {
            path_part
        };

        let host = parse_host(source, host_part, &schemes)?;

        Ok(Self::Url(UrlPattern {
            schemes,
            host,
            path: compile_path(source, &serialize_path(path))?,
        }))
    }
}

/// Split `/body/` or `/body/i` into the regex body and its case flag.
fn regex_body(s: &str) -> Option<(&str, bool)> {
    let inner = s.strip_prefix('/')?;
    if let Some(body) = inner.strip_suffix("/i") {
        return (!body.is_empty()).then_some((body, true));
    }
    let body = inner.strip_suffix('/')?;
    (!body.is_empty()).then_some((body, false))
}

fn expand_scheme(
    source: &str,
    scheme: &str,
    options: &MatcherOptions,
) -> MatcherResult<Vec<String>> {
    let scheme = scheme.to_ascii_lowercase();
    let invalid = || MatcherError::InvalidScheme {
        pattern: source.to_owned(),
        scheme: scheme.clone(),
    };

    if scheme == "*" {
        return Ok(options.wildcard_schemes.clone());
    }
    if scheme.is_empty()
        || !scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.' | '*'))
    {
        return Err(invalid());
    }
    if scheme.contains('*') {
        let glob = PathGlob::compile(&scheme).map_err(|_| invalid())?;
        let expanded: Vec<String> = KNOWN_SCHEMES
            .iter()
            .filter(|s| glob.is_match(s))
            .map(|s| (*s).to_owned())
            .collect();
        if expanded.is_empty() {
            return Err(invalid());
        }
        return Ok(expanded);
    }
    Ok(vec![scheme])
}

fn parse_host(source: &str, raw: &str, schemes: &[String]) -> MatcherResult<HostPattern> {
    let invalid = |reason: &str| MatcherError::InvalidHost {
        pattern: source.to_owned(),
        reason: reason.to_owned(),
    };

    let is_port = |p: &str| p == "*" || p.chars().all(|c| c.is_ascii_digit());

    if let Some(rest) = raw.strip_prefix('[') {
        let Some((addr, after)) = rest.split_once(']') else {
            return Err(invalid("unterminated '['"));
        };
        if !(after.is_empty() || after.strip_prefix(':').is_some_and(is_port)) {
            return Err(invalid("unexpected text after ']'"));
        }
        // Serialized exactly as `Url::host_str` reports it.
        return match Host::parse(&format!("[{addr}]")) {
            Ok(ip @ Host::Ipv6(_)) => Ok(HostPattern::Labels(vec![HostLabel::Exact(
                ip.to_string(),
            )])),
            _ => Err(invalid("invalid IPv6 literal")),
        };
    }

    // Patterns are port-agnostic.
    let host = match raw.rsplit_once(':') {
        Some((h, port)) if is_port(port) => h,
        Some(_) => return Err(invalid("unexpected ':'")),
        None => raw,
    };
    let host = host.trim_end_matches('.').to_ascii_lowercase();

    if host.is_empty() {
        // Only `file:///path` legitimately has no host.
        return if schemes.iter().all(|s| s == "file") {
            Ok(HostPattern::Labels(Vec::new()))
        } else {
            Err(invalid("missing host"))
        };
    }
    if host == "*" {
        return Ok(HostPattern::Any);
    }

    let mut labels = Vec::new();
    for label in host.split('.').rev() {
        if label == "*" {
            labels.push(HostLabel::Wildcard);
            continue;
        }
        if label.is_empty() {
            return Err(invalid("empty label"));
        }
        if label.contains('*') {
            return Err(invalid("'*' must be a whole label"));
        }
        if label
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '/' | '?' | '#' | '@' | ':'))
        {
            return Err(invalid("illegal character"));
        }
        let label = if label.is_ascii() {
            label.to_owned()
        } else {
            punycode_label(label).ok_or_else(|| invalid("invalid internationalized label"))?
        };
        labels.push(HostLabel::Exact(label));
    }
    Ok(HostPattern::Labels(labels))
}

/// IDNA-encode one non-ASCII label (`例子` to `xn--fsqu00a`).
fn punycode_label(label: &str) -> Option<String> {
    match Host::parse(label) {
        Ok(Host::Domain(ascii)) if !ascii.is_empty() && !ascii.contains('.') => Some(ascii),
        _ => None,
    }
}

/// Percent-encode a path glob the way request URLs are encoded.
///
/// `*` is outside every URL encode set, so wildcards pass through. A
/// fragment is dropped, matching the request side.
fn serialize_path(path: &str) -> String {
    match Url::parse(&format!("{PATH_ORIGIN}{path}")) {
        Ok(url) => match url.query() {
            Some(q) => format!("{}?{q}", url.path()),
            None => url.path().to_owned(),
        },
        Err(_) => path.to_owned(),
    }
}

fn compile_path(source: &str, glob: &str) -> MatcherResult<PathGlob> {
    PathGlob::compile(glob).map_err(|e| MatcherError::InvalidPath {
        pattern: source.to_owned(),
        source: e,
    })
}
