use std::collections::BTreeMap;
use std::sync::Arc;

use super::entry::Entry;
use super::operator_set::OperatorSet;
use crate::capability::CapabilityKey;

/// Index from a capability to every operator that owns it.
///
/// The index is consumed destructively: [`pop`](Self::pop) and
/// [`pop_owners`](Self::pop_owners) each remove one capability per call.
/// Callers must not rely on the order in which capabilities come out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultiOwnerSet {
    owners: BTreeMap<CapabilityKey, OperatorSet>,
}

impl MultiOwnerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every operator in `operators` under the capabilities it provides.
    ///
    /// Operators keep the key they have in `operators`.
    pub fn from_providers(operators: &OperatorSet) -> Self {
        let mut index = Self::new();
        for (key, entry) in operators {
            for api in entry.provided_apis.iter() {
                index.insert(api.without_plural(), key.clone(), Arc::clone(entry));
            }
        }
        index
    }

    /// Index every operator in `operators` under the capabilities it requires.
    pub fn from_requirers(operators: &OperatorSet) -> Self {
        let mut index = Self::new();
        for (key, entry) in operators {
            for api in entry.required_apis.iter() {
                index.insert(api.without_plural(), key.clone(), Arc::clone(entry));
            }
        }
        index
    }

    /// Record `entry` (under `owner`) as an owner of `capability`
    pub fn insert(&mut self, capability: CapabilityKey, owner: impl Into<String>, entry: Arc<Entry>) {
        self.owners.entry(capability).or_default().insert(owner, entry);
    }

    pub fn owners(&self, capability: &CapabilityKey) -> Option<&OperatorSet> {
        self.owners.get(capability)
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Remove one capability and return it together with its owners.
    pub fn pop_entry(&mut self) -> Option<(CapabilityKey, OperatorSet)> {
        self.owners.pop_first()
    }

    /// Remove one capability from the index, or `None` once it is exhausted
    pub fn pop(&mut self) -> Option<CapabilityKey> {
        self.pop_entry().map(|(key, _)| key)
    }

    /// Remove one capability and return its owners.
    ///
    /// An exhausted index returns an empty set.
    pub fn pop_owners(&mut self) -> OperatorSet {
        self.pop_entry().map(|(_, owners)| owners).unwrap_or_default()
    }
}
