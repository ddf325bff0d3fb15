//! Skein Capabilities - maps declared grants to capability bindings.
//!
//! This crate provides:
//! - The [`Capability`] trait that privileged `GM_*` implementations satisfy
//! - [`CapabilityRegistry`], an explicitly constructed table from grant name
//!   to [`CapabilityEntry`] (`{implementation, depends_on}`)
//! - [`CapabilityResolver`], which turns a script's grant list into a fresh
//!   [`BindingSet`], pulling in transitive dependencies
//!
//! The concrete capabilities (network, clipboard, tabs, storage) live
//! outside this crate; only lookup, gating metadata and wiring live here.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use skein_capabilities::{CapabilityEntry, CapabilityRegistry, CapabilityResolver};
//!
//! let registry = CapabilityRegistry::new()
//!     .with("GM_info", CapabilityEntry::constant(serde_json::json!({"version": "1.0"})))
//!     .with("GM.info", CapabilityEntry::constant(serde_json::json!({"version": "1.0"})));
//!
//! let resolver = CapabilityResolver::new(Arc::new(registry));
//! let bindings = resolver.resolve(&["GM_info", "GM.info", "GM_doesNotExist"]);
//!
//! assert!(bindings.get("GM_info").is_some());
//! assert!(bindings.namespace("GM").is_some_and(|ns| ns.get("info").is_some()));
//! assert_eq!(bindings.dropped(), ["GM_doesNotExist"]);
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod binding;
mod capability;
mod error;
mod registry;
mod resolver;

pub use binding::{Binding, BindingSet, Namespace, TopLevel};
pub use capability::{Capability, CapabilityCall, CapabilityImpl};
pub use error::{CapabilityError, CapabilityResult};
pub use registry::{CapabilityEntry, CapabilityRegistry, GRANT_NONE, UNSAFE_WINDOW};
pub use resolver::CapabilityResolver;
