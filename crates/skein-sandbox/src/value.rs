//! Values visible inside a sandbox.

use serde_json::Value as Json;
use skein_capabilities::{Binding, Namespace};
use std::sync::Arc;

use crate::page::PageGlobal;

/// A value a script can read or assign.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Property miss.
    #[default]
    Undefined,
    /// Plain data.
    Data(Json),
    /// A granted capability.
    Capability(Binding),
    /// A namespace object such as `GM`.
    Namespace(Arc<Namespace>),
    /// The page's global object (`unsafeWindow`).
    Global(PageGlobal),
}

impl Value {
    /// Whether this is [`Value::Undefined`].
    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// The data payload, if this is plain data.
    #[must_use]
    pub fn as_data(&self) -> Option<&Json> {
        match self {
            Self::Data(v) => Some(v),
            _ => None,
        }
    }

    /// The capability binding, if this is one.
    #[must_use]
    pub fn as_capability(&self) -> Option<&Binding> {
        match self {
            Self::Capability(b) => Some(b),
            _ => None,
        }
    }

    /// The page global handle, if this is one.
    #[must_use]
    pub fn as_global(&self) -> Option<&PageGlobal> {
        match self {
            Self::Global(g) => Some(g),
            _ => None,
        }
    }

    /// Read a member one level down.
    ///
    /// Namespaces yield their capability members, data objects their fields,
    /// the page global its properties. Anything else is `Undefined`, so
    /// probing `GM.notThere` is as harmless as probing a missing global.
    #[must_use]
    pub fn member(&self, key: &str) -> Self {
        match self {
            Self::Namespace(ns) => ns
                .get(key)
                .map_or(Self::Undefined, |b| Self::Capability(b.clone())),
            Self::Data(Json::Object(map)) => map
                .get(key)
                .map_or(Self::Undefined, |v| Self::Data(v.clone())),
            Self::Global(page) => page.get(key),
            Self::Undefined | Self::Data(_) | Self::Capability(_) => Self::Undefined,
        }
    }

    /// Whether two values are the same data, or the same object by identity.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) => true,
            (Self::Data(a), Self::Data(b)) => a == b,
            (Self::Capability(a), Self::Capability(b)) => a.grant() == b.grant(),
            (Self::Namespace(a), Self::Namespace(b)) => Arc::ptr_eq(a, b),
            (Self::Global(a), Self::Global(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<Json> for Value {
    fn from(value: Json) -> Self {
        Self::Data(value)
    }
}
