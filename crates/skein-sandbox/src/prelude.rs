//! Prelude module - commonly used types for convenient import.
//!
//! Use `use skein_sandbox::prelude::*;` to import all essential types.

pub use crate::{PageGlobal, SandboxBuilder, SandboxContext, Value, build};
