//! Reversed-label host trie.
//!
//! `sub.example.com` is stored along the path `com -> example -> sub`. A
//! whole-label `*` is kept on a separate edge that lookups consult alongside
//! the exact edge. When a pattern ends in that wildcard (its leftmost label
//! was `*`), its rules match any host with one or more further labels, so
//! `*.example.com` matches `a.example.com` and `a.b.example.com` but not
//! `example.com`.

use std::collections::HashMap;

use crate::pattern::HostLabel;

/// A node in the host trie, holding the rules registered at this host.
#[derive(Debug)]
pub(crate) struct HostNode<R> {
    children: HashMap<String, HostNode<R>>,
    wildcard: Option<Box<HostNode<R>>>,
    rules: Vec<R>,
}

impl<R> Default for HostNode<R> {
    fn default() -> Self {
        Self {
            children: HashMap::new(),
            wildcard: None,
            rules: Vec::new(),
        }
    }
}

impl<R> HostNode<R> {
    /// Insert a rule at the node addressed by `labels` (already reversed).
    pub(crate) fn insert(&mut self, labels: &[HostLabel], rule: R) {
        let Some((first, rest)) = labels.split_first() else {
            self.rules.push(rule);
            return;
        };
        let child = match first {
            HostLabel::Exact(label) => self.children.entry(label.clone()).or_default(),
            HostLabel::Wildcard => self.wildcard.get_or_insert_with(Box::default),
        };
        child.insert(rest, rule);
    }

    /// Remove every rule at `labels` for which `remove` returns true.
    ///
    /// Empty branches are pruned on the way back up. Returns the number of
    /// rules removed.
    pub(crate) fn remove_where(
        &mut self,
        labels: &[HostLabel],
        remove: &mut impl FnMut(&R) -> bool,
    ) -> usize {
        let Some((first, rest)) = labels.split_first() else {
            let before = self.rules.len();
            self.rules.retain(|r| !remove(r));
            return before.saturating_sub(self.rules.len());
        };
        match first {
            HostLabel::Exact(label) => {
                let Some(child) = self.children.get_mut(label) else {
                    return 0;
                };
                let removed = child.remove_where(rest, remove);
                if child.is_empty() {
                    self.children.remove(label);
                }
                removed
            },
            HostLabel::Wildcard => {
                let Some(child) = self.wildcard.as_mut() else {
                    return 0;
                };
                let removed = child.remove_where(rest, remove);
                if child.is_empty() {
                    self.wildcard = None;
                }
                removed
            },
        }
    }

    /// Collect every rule whose host pattern matches `labels` (reversed).
    pub(crate) fn collect<'a>(&'a self, labels: &[&str], out: &mut Vec<&'a R>) {
        let Some((first, rest)) = labels.split_first() else {
            out.extend(self.rules.iter());
            return;
        };
        if let Some(child) = self.children.get(*first) {
            child.collect(rest, out);
        }
        if let Some(wild) = &self.wildcard {
            // Rules ending here swallow every remaining label.
            out.extend(wild.rules.iter());
            if !rest.is_empty() {
                wild.collect(rest, out);
            }
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.rules.is_empty() && self.children.is_empty() && self.wildcard.is_none()
    }
}
