//! Binding sets: the capabilities one script execution may see.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::capability::CapabilityImpl;

/// A resolved grant.
#[derive(Debug, Clone)]
pub struct Binding {
    grant: String,
    implementation: CapabilityImpl,
}

impl Binding {
    pub(crate) fn new(grant: impl Into<String>, implementation: CapabilityImpl) -> Self {
        Self {
            grant: grant.into(),
            implementation,
        }
    }

    /// The full grant name (`GM_setValue`, `GM.getValue`).
    #[must_use]
    pub fn grant(&self) -> &str {
        &self.grant
    }

    /// What the grant resolved to.
    #[must_use]
    pub fn implementation(&self) -> &CapabilityImpl {
        &self.implementation
    }
}

/// Members of a dotted grant prefix, e.g. every `GM.*` grant.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    name: String,
    members: BTreeMap<String, Binding>,
}

impl Namespace {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            members: BTreeMap::new(),
        }
    }

    /// The namespace name (`GM`).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a member (`getValue`).
    #[must_use]
    pub fn get(&self, member: &str) -> Option<&Binding> {
        self.members.get(member)
    }

    /// Member names, sorted.
    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the namespace has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// What a top-level identifier resolves to inside a binding set.
#[derive(Debug, Clone, Copy)]
pub enum TopLevel<'a> {
    /// A flat grant such as `GM_setValue`.
    Binding(&'a Binding),
    /// A namespace object such as `GM`.
    Namespace(&'a Arc<Namespace>),
}

/// The capability bindings for one script execution.
///
/// Built fresh by every [`resolve`](crate::CapabilityResolver::resolve) call
/// and deliberately not `Clone`: two executions never share a binding set,
/// even when their grant lists are identical.
#[derive(Debug, Default)]
pub struct BindingSet {
    flat: BTreeMap<String, Binding>,
    namespaces: BTreeMap<String, Arc<Namespace>>,
    order: Vec<String>,
    dropped: Vec<String>,
}

impl BindingSet {
    /// An empty binding set.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Look up a grant by its full name, flat or dotted.
    #[must_use]
    pub fn get(&self, grant: &str) -> Option<&Binding> {
        match grant.split_once('.') {
            Some((ns, member)) if !ns.is_empty() && !member.is_empty() => {
                self.namespaces.get(ns).and_then(|n| n.get(member))
            },
            _ => self.flat.get(grant),
        }
    }

    /// Look up a top-level identifier as a script would read it.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<TopLevel<'_>> {
        if let Some(binding) = self.flat.get(key) {
            return Some(TopLevel::Binding(binding));
        }
        self.namespaces.get(key).map(TopLevel::Namespace)
    }

    /// Look up a namespace object.
    #[must_use]
    pub fn namespace(&self, name: &str) -> Option<&Arc<Namespace>> {
        self.namespaces.get(name)
    }

    /// Whether a grant is bound.
    #[must_use]
    pub fn contains(&self, grant: &str) -> bool {
        self.get(grant).is_some()
    }

    /// Resolved grant names, in resolution order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// Top-level identifiers this set defines (flat grants and namespaces).
    pub fn top_level_keys(&self) -> impl Iterator<Item = &str> {
        self.flat
            .keys()
            .chain(self.namespaces.keys())
            .map(String::as_str)
    }

    /// Requested grants that were not in the registry.
    #[must_use]
    pub fn dropped(&self) -> &[String] {
        &self.dropped
    }

    /// Number of resolved grants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether nothing was resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Accumulates bindings during resolution.
#[derive(Debug, Default)]
pub(crate) struct BindingSetBuilder {
    flat: BTreeMap<String, Binding>,
    namespaces: BTreeMap<String, Namespace>,
    order: Vec<String>,
    dropped: Vec<String>,
}

impl BindingSetBuilder {
    pub(crate) fn insert(&mut self, grant: &str, implementation: CapabilityImpl) {
        let binding = Binding::new(grant, implementation);
        match grant.split_once('.') {
            Some((ns, member)) if !ns.is_empty() && !member.is_empty() => {
                self.namespaces
                    .entry(ns.to_owned())
                    .or_insert_with(|| Namespace::new(ns))
                    .members
                    .insert(member.to_owned(), binding);
            },
            _ => {
                self.flat.insert(grant.to_owned(), binding);
            },
        }
        self.order.push(grant.to_owned());
    }

    pub(crate) fn drop_grant(&mut self, grant: &str) {
        self.dropped.push(grant.to_owned());
    }

    pub(crate) fn finish(self) -> BindingSet {
        BindingSet {
            flat: self.flat,
            namespaces: self
                .namespaces
                .into_iter()
                .map(|(k, v)| (k, Arc::new(v)))
                .collect(),
            order: self.order,
            dropped: self.dropped,
        }
    }
}
