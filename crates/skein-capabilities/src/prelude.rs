//! Prelude module - commonly used types for convenient import.
//!
//! Use `use skein_capabilities::prelude::*;` to import all essential types.

// Errors
pub use crate::{CapabilityError, CapabilityResult};

// Capability implementations
pub use crate::{Capability, CapabilityCall, CapabilityImpl};

// Registry and resolution
pub use crate::{CapabilityEntry, CapabilityRegistry, CapabilityResolver};

// Bindings
pub use crate::{Binding, BindingSet, Namespace, TopLevel};
