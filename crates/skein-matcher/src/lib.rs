//! Skein Matcher - decides which registered scripts apply to a URL.
//!
//! Patterns come in three shapes:
//!
//! - `scheme://host-glob/path-glob` (e.g. `*://*.example.com/*`)
//! - a bare domain (e.g. `example.com`, `*.example.com`)
//! - a regular expression written `/.../` (e.g. `/^https:\/\/a\.b\//i`)
//!
//! URL patterns are indexed by scheme, then by host in reversed label order
//! (TLD first), so a leading `*.` wildcard becomes a prefix lookup in a trie.
//! Path globs are compiled to anchored regular expressions once, when a
//! pattern is added. Regular expression patterns cannot be indexed by host and
//! are kept in a side list.
//!
//! Registration never fails: a malformed pattern is accepted and simply
//! matches nothing, so one script's bad metadata cannot break matching for
//! every other script.
//!
//! # Example
//!
//! ```
//! use skein_matcher::UrlMatcher;
//!
//! let mut matcher = UrlMatcher::new();
//! matcher.add("*://*.baidu.com/", "ok");
//! matcher.add("http://test.baidu.com/*", "ok4");
//!
//! assert_eq!(matcher.match_url("http://test.baidu.com/"), vec!["ok", "ok4"]);
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod host;
mod matcher;
mod pattern;
mod script;
mod shared;

pub use error::{MatcherError, MatcherResult};
pub use matcher::UrlMatcher;
pub use pattern::{HostLabel, HostPattern, MatcherOptions, PathGlob, Pattern, UrlPattern};
pub use script::{PatternKind, PatternSet, ScriptMatcher};
pub use shared::SharedScriptMatcher;
