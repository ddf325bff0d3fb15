//! Pattern parsing errors.
//!
//! These are only ever returned from [`Pattern::parse`](crate::Pattern::parse).
//! The matchers swallow them and treat the pattern as inert.

use thiserror::Error;

/// Errors that can occur while compiling a pattern.
#[derive(Debug, Error)]
pub enum MatcherError {
    /// The pattern was empty or whitespace.
    #[error("empty pattern")]
    Empty,

    /// The scheme part of a URL pattern is not usable.
    #[error("invalid scheme in {pattern:?}: {scheme:?}")]
    InvalidScheme {
        /// The full pattern source.
        pattern: String,
        /// The offending scheme.
        scheme: String,
    },

    /// The host part of the pattern is not usable.
    #[error("invalid host in {pattern:?}: {reason}")]
    InvalidHost {
        /// The full pattern source.
        pattern: String,
        /// Why the host was rejected.
        reason: String,
    },

    /// The path glob could not be compiled.
    #[error("invalid path in {pattern:?}: {source}")]
    InvalidPath {
        /// The full pattern source.
        pattern: String,
        /// Underlying regex error.
        source: regex::Error,
    },

    /// A `/.../` pattern did not contain a valid regular expression.
    #[error("invalid regex {pattern:?}: {source}")]
    InvalidRegex {
        /// The full pattern source.
        pattern: String,
        /// Underlying regex error.
        source: regex::Error,
    },
}

/// Result type for pattern compilation.
pub type MatcherResult<T> = Result<T, MatcherError>;
