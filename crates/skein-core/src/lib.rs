//! Skein Core - Foundation types for the skein userscript manager.
//!
//! This crate provides:
//! - [`ScriptId`], the opaque identifier every other subsystem keys on
//! - [`RunAt`], the injection point a script declares
//! - [`Timestamp`], a UTC wall-clock wrapper used for expiries
//!
//! It has no dependencies on other internal skein crates.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod error;
pub mod types;

pub use error::{CoreError, CoreResult};
pub use types::{RunAt, ScriptId, Timestamp};
