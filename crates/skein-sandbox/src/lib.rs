//! Skein Sandbox - isolated global namespaces for userscripts.
//!
//! Each script execution gets a [`SandboxContext`] that owns three things:
//!
//! 1. a private property store for globals the script assigns,
//! 2. the script's [`BindingSet`](skein_capabilities::BindingSet),
//! 3. a handle to the page's real global object ([`PageGlobal`]).
//!
//! # Access policy
//!
//! - **Read**: private store, then binding set, then the page global.
//!   A miss everywhere yields [`Value::Undefined`], never an error.
//! - **Write**: if the key is already an own property of the page global it
//!   is written through, so page-level singletons stay singletons. Any other
//!   key lands in the private store and never reaches the page.
//!
//! # Example
//!
//! ```
//! use skein_capabilities::BindingSet;
//! use skein_sandbox::{PageGlobal, Value, build};
//!
//! let page = PageGlobal::new().with("onload", Value::from(serde_json::Value::Null));
//! let mut sandbox = build(BindingSet::empty(), page.clone());
//!
//! sandbox.set("myHelper", Value::from(serde_json::json!(42)));
//! sandbox.set("onload", Value::from(serde_json::json!("handler")));
//!
//! assert!(page.get("myHelper").is_undefined());
//! assert_eq!(page.get("onload").as_data(), Some(&serde_json::json!("handler")));
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod context;
mod page;
mod value;

pub use context::{SandboxBuilder, SandboxContext, build};
pub use page::PageGlobal;
pub use value::Value;
