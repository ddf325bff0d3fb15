//! Prelude module - commonly used types for convenient import.
//!
//! Use `use skein_core::prelude::*;` to import all essential types.

pub use crate::{CoreError, CoreResult};
pub use crate::{RunAt, ScriptId, Timestamp};
