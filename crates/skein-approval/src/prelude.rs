//! Prelude module - commonly used types for convenient import.
//!
//! Use `use skein_approval::prelude::*;` to import all essential types.

pub use crate::{
    ApprovalError, ApprovalResult, BrokerOptions, ConfirmHandler, ConfirmKey, ConfirmRequest,
    ConfirmResponse, ConfirmScope, ConfirmationCache, Decision, PermissionBroker, RequestId,
};
