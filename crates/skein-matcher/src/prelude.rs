//! Prelude module - commonly used types for convenient import.
//!
//! Use `use skein_matcher::prelude::*;` to import all essential types.

// Errors
pub use crate::{MatcherError, MatcherResult};

// Matchers
pub use crate::{ScriptMatcher, SharedScriptMatcher, UrlMatcher};

// Patterns
pub use crate::{MatcherOptions, Pattern, PatternKind, PatternSet};
