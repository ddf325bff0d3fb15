//! Skein Approval - user-mediated permission decisions.
//!
//! The [`PermissionBroker`] answers "may this script use this capability on
//! this resource?" by:
//!
//! 1. checking the [`ConfirmationCache`] for a remembered decision,
//! 2. otherwise attaching to an identical in-flight prompt if one exists,
//! 3. otherwise emitting a [`ConfirmRequest`] over a
//!    [`DeliveryChannel`](skein_events::DeliveryChannel) stream and waiting
//!    for the matching [`ConfirmResponse`], up to a timeout.
//!
//! Denial and timeout are ordinary [`Decision`] values, not errors.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod broker;
mod cache;
mod error;
mod handler;
mod request;

pub use broker::{BrokerOptions, DEFAULT_CONFIRM_STREAM, DEFAULT_CONFIRM_TIMEOUT, PermissionBroker};
pub use cache::{ConfirmationCache, WILDCARD_RESOURCE};
pub use error::{ApprovalError, ApprovalResult};
pub use handler::ConfirmHandler;
pub use request::{ConfirmKey, ConfirmRequest, ConfirmResponse, ConfirmScope, Decision, RequestId};
