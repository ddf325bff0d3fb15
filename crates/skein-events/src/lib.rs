//! Skein Events - ordered message delivery across execution contexts.
//!
//! Some injection points run before the host has negotiated a transport to
//! the other side. A [`DeliveryChannel`] absorbs that gap: every stream
//! starts out buffering, and binding it to a [`Transport`] replays the
//! buffer in send order before any new message goes out directly.
//!
//! ```text
//!   dispatch ──► [Buffering] ──bind──► [Bound] ──► Transport
//!                  │ buffer                ▲
//!                  └──── replayed once ────┘
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use skein_events::{DeliveryChannel, LocalTransport};
//!
//! let (transport, mut rx) = LocalTransport::pair();
//! let channel = DeliveryChannel::new(Arc::new(transport));
//!
//! channel.dispatch("page", serde_json::json!("early"));
//! assert!(rx.try_recv().is_none());
//!
//! channel.bind("page").unwrap();
//! channel.dispatch("page", serde_json::json!("late"));
//!
//! assert_eq!(rx.try_recv().unwrap().payload, "early");
//! assert_eq!(rx.try_recv().unwrap().payload, "late");
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod channel;
mod envelope;
mod error;
mod transport;

pub use channel::{DEFAULT_BUFFER_WARN_THRESHOLD, DeliveryChannel, StreamState};
pub use envelope::Envelope;
pub use error::{ChannelError, ChannelResult};
pub use transport::{LocalReceiver, LocalTransport, Transport};
