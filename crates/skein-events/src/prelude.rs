//! Prelude module - commonly used types for convenient import.
//!
//! Use `use skein_events::prelude::*;` to import all essential types.

pub use crate::{
    ChannelError, ChannelResult, DeliveryChannel, Envelope, LocalReceiver, LocalTransport,
    StreamState, Transport,
};
