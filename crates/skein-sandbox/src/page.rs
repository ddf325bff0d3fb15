//! The page's real global object.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::value::Value;

/// Shared handle to the page global.
///
/// Clones share the same property map, so every sandbox on a page observes
/// writes made through any of them.
#[derive(Clone, Default)]
pub struct PageGlobal {
    props: Arc<RwLock<HashMap<String, Value>>>,
}

impl PageGlobal {
    /// Create an empty page global.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style property setter.
    #[must_use]
    pub fn with(self, key: impl Into<String>, value: Value) -> Self {
        self.set(key, value);
        self
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Value>> {
        self.props.read().unwrap_or_else(|e| {
            tracing::warn!("page global read lock poisoned, recovering");
            e.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Value>> {
        self.props.write().unwrap_or_else(|e| {
            tracing::warn!("page global write lock poisoned, recovering");
            e.into_inner()
        })
    }

    /// Read a property, `Undefined` when absent.
    #[must_use]
    pub fn get(&self, key: &str) -> Value {
        self.read().get(key).cloned().unwrap_or_default()
    }

    /// Whether `key` is an own property.
    #[must_use]
    pub fn has_own(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    /// Set a property, returning the previous value.
    pub fn set(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.write().insert(key.into(), value)
    }

    /// Overwrite `key` only if it already exists.
    ///
    /// Hands `value` back when the key is absent. The check and the write
    /// happen under one lock.
    pub fn set_existing(&self, key: &str, value: Value) -> Result<(), Value> {
        let mut props = self.write();
        match props.get_mut(key) {
            Some(slot) => {
                *slot = value;
                Ok(())
            },
            None => Err(value),
        }
    }

    /// Remove a property.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.write().remove(key)
    }

    /// Own property names, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.read().keys().cloned().collect();
        keys.sort_unstable();
        keys
    }

    /// Whether two handles refer to the same page.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.props, &other.props)
    }
}

// Properties may hold the page itself (`window.window`), so only the size is
// printed.
impl fmt::Debug for PageGlobal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageGlobal")
            .field("properties", &self.read().len())
            .finish()
    }
}
