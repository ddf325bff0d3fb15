//! Prelude module - commonly used types for convenient import.
//!
//! Use `use skein_runtime::prelude::*;` to import all essential types.

pub use crate::{Execution, RuntimeError, RuntimeResult, ScriptManager, ScriptMetadata};
