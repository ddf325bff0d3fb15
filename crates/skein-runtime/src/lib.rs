//! Skein Runtime - script management and capability dispatch.
//!
//! This crate provides:
//! - [`ScriptManager`], the registry of installed scripts and their patterns
//! - [`Execution`], one script run with its sandbox and gated capability calls
//! - [`config_bridge`], conversions from [`skein_config::Config`] to domain types
//!
//! # Architecture
//!
//! A navigation flows through the manager as:
//!
//! 1. the pattern matcher picks the enabled scripts for the URL and
//!    injection point,
//! 2. the capability resolver builds a fresh binding set per script,
//! 3. the sandbox builder wraps it with the page global,
//! 4. capability calls that name a resource go through the permission
//!    broker before they run.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use skein_approval::PermissionBroker;
//! use skein_capabilities::CapabilityRegistry;
//! use skein_core::{RunAt, ScriptId};
//! use skein_events::DeliveryChannel;
//! use skein_runtime::{ScriptManager, ScriptMetadata};
//! use skein_sandbox::PageGlobal;
//!
//! # async fn example() -> Result<(), skein_runtime::RuntimeError> {
//! let broker = Arc::new(PermissionBroker::new(Arc::new(DeliveryChannel::unbound())));
//! let manager = ScriptManager::new(Arc::new(CapabilityRegistry::with_builtins()), broker);
//!
//! manager.install(
//!     ScriptMetadata::new(ScriptId::new(), "hello")
//!         .with_match("*://*.example.com/*")
//!         .with_grant("unsafeWindow"),
//! );
//!
//! let page = PageGlobal::new();
//! for execution in manager.navigate("https://www.example.com/", RunAt::DocumentIdle, &page) {
//!     let _window = execution.sandbox().get("unsafeWindow");
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config_bridge;
pub mod prelude;

mod error;
mod execution;
mod manager;
mod metadata;

pub use error::{RuntimeError, RuntimeResult};
pub use execution::Execution;
pub use manager::ScriptManager;
pub use metadata::ScriptMetadata;
