//! The capability trait and its tagged implementation variant.

use async_trait::async_trait;
use serde_json::Value;
use skein_core::ScriptId;
use std::fmt;
use std::sync::Arc;

use crate::error::CapabilityResult;

/// One invocation of a capability by a script.
#[derive(Debug, Clone)]
pub struct CapabilityCall {
    /// The calling script.
    pub script_id: ScriptId,
    /// The grant name the script called through (`GM_setValue`, `GM.getValue`).
    pub grant: String,
    /// Call arguments as a JSON array or object.
    pub args: Value,
}

impl CapabilityCall {
    /// Create a new call.
    #[must_use]
    pub fn new(script_id: ScriptId, grant: impl Into<String>, args: Value) -> Self {
        Self {
            script_id,
            grant: grant.into(),
            args,
        }
    }

    /// Positional argument `index`, if `args` is an array.
    #[must_use]
    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.as_array().and_then(|a| a.get(index))
    }
}

/// A privileged operation exposed to scripts.
///
/// Implementations live outside the core; the core only needs to call them
/// and to know which resource a call touches.
#[async_trait]
pub trait Capability: Send + Sync {
    /// Run the capability.
    async fn invoke(&self, call: CapabilityCall) -> CapabilityResult<Value>;

    /// The resource a call with these arguments targets.
    ///
    /// `Some(key)` means the call must be confirmed by the user for
    /// `(script, grant, key)` before [`invoke`](Self::invoke) runs.
    fn resource_key(&self, _args: &Value) -> Option<String> {
        None
    }
}

/// What a grant name resolves to.
#[derive(Clone)]
pub enum CapabilityImpl {
    /// A callable capability.
    Function(Arc<dyn Capability>),
    /// A plain value (e.g. `GM_info`).
    Constant(Value),
    /// The page's real global object (the `unsafeWindow` grant).
    PageGlobal,
}

impl CapabilityImpl {
    /// The callable capability, if this is one.
    #[must_use]
    pub fn as_function(&self) -> Option<&Arc<dyn Capability>> {
        match self {
            Self::Function(f) => Some(f),
            Self::Constant(_) | Self::PageGlobal => None,
        }
    }

    /// Short name of the variant, for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Function(_) => "function",
            Self::Constant(_) => "constant",
            Self::PageGlobal => "page_global",
        }
    }
}

impl fmt::Debug for CapabilityImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function(_) => f.write_str("Function(..)"),
            Self::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
            Self::PageGlobal => f.write_str("PageGlobal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Echo;

    #[async_trait]
    impl Capability for Echo {
        async fn invoke(&self, call: CapabilityCall) -> CapabilityResult<Value> {
            Ok(call.args)
        }
    }

    #[tokio::test]
    async fn test_function_impl_invokes() {
        let imp = CapabilityImpl::Function(Arc::new(Echo));
        let f = imp.as_function().unwrap();
        let call = CapabilityCall::new(ScriptId::new(), "GM_echo", json!([1, 2]));
        assert_eq!(call.arg(1), Some(&json!(2)));
        assert_eq!(f.invoke(call).await.unwrap(), json!([1, 2]));
        assert!(f.resource_key(&json!([])).is_none());
    }

    #[test]
    fn test_kind_and_debug() {
        let c = CapabilityImpl::Constant(json!({"a": 1}));
        assert_eq!(c.kind(), "constant");
        assert!(c.as_function().is_none());
        assert!(format!("{c:?}").contains("Constant"));
        assert_eq!(format!("{:?}", CapabilityImpl::PageGlobal), "PageGlobal");
    }
}
