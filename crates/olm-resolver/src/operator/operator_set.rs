use std::collections::btree_map;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::entry::Entry;
use crate::capability::CapabilitySet;

/// A set of operators keyed by name.
///
/// Used both for the installed state and for a resolution result. Keys are
/// kept in order so iteration is deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperatorSet {
    entries: BTreeMap<String, Arc<Entry>>,
}

impl OperatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry under an explicit key, returning the entry it replaced
    pub fn insert(&mut self, key: impl Into<String>, entry: Arc<Entry>) -> Option<Arc<Entry>> {
        self.entries.insert(key.into(), entry)
    }

    /// Insert an entry under its own name
    pub fn add(&mut self, entry: Arc<Entry>) -> Option<Arc<Entry>> {
        self.entries.insert(entry.name.clone(), entry)
    }

    pub fn get(&self, key: &str) -> Option<&Arc<Entry>> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Arc<Entry>> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Arc<Entry>> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = &Arc<Entry>> + '_ {
        self.entries.values()
    }

    /// Find the operator installed for `package`, if any
    pub fn for_package(&self, package: &str) -> Option<&Arc<Entry>> {
        self.entries.values().find(|e| e.package() == Some(package))
    }

    /// Union of every member's provided capabilities
    pub fn provided_apis(&self) -> CapabilitySet {
        let mut apis = CapabilitySet::new();
        for entry in self.entries.values() {
            apis.extend(entry.provided_apis.iter().cloned());
        }
        apis
    }

    /// Union of every member's required capabilities
    pub fn required_apis(&self) -> CapabilitySet {
        let mut apis = CapabilitySet::new();
        for entry in self.entries.values() {
            apis.extend(entry.required_apis.iter().cloned());
        }
        apis
    }
}

impl FromIterator<Arc<Entry>> for OperatorSet {
    fn from_iter<I: IntoIterator<Item = Arc<Entry>>>(iter: I) -> Self {
        let mut set = OperatorSet::new();
        for entry in iter {
            set.add(entry);
        }
        set
    }
}

impl FromIterator<Entry> for OperatorSet {
    fn from_iter<I: IntoIterator<Item = Entry>>(iter: I) -> Self {
        iter.into_iter().map(Arc::new).collect()
    }
}

impl IntoIterator for OperatorSet {
    type Item = (String, Arc<Entry>);
    type IntoIter = btree_map::IntoIter<String, Arc<Entry>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a OperatorSet {
    type Item = (&'a String, &'a Arc<Entry>);
    type IntoIter = btree_map::Iter<'a, String, Arc<Entry>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::CapabilityKey;
    use crate::operator::{OperatorSourceInfo, SourceKey};

    #[test]
    fn test_add_and_lookup() {
        let mut set = OperatorSet::new();
        assert!(set.is_empty());

        set.add(Arc::new(Entry::new("op1")));
        set.insert("alias", Arc::new(Entry::new("op2")));

        assert_eq!(set.len(), 2);
        assert!(set.contains("op1"));
        assert_eq!(set.get("alias").map(|e| e.name.as_str()), Some("op2"));
        assert_eq!(set.keys().collect::<Vec<_>>(), vec!["alias", "op1"]);
    }

    #[test]
    fn test_provided_and_required_apis() {
        let set: OperatorSet = vec![
            Entry::new("a")
                .providing(CapabilityKey::new("birds.com", "v1", "Goose"))
                .requiring(CapabilityKey::new("mammals.com", "v1", "Moose")),
            Entry::new("b").providing(CapabilityKey::new("mammals.com", "v1", "Moose")),
        ]
        .into_iter()
        .collect();

        assert_eq!(set.provided_apis().to_string(), "Goose.v1.birds.com,Moose.v1.mammals.com");
        assert!(set.required_apis().is_subset(&set.provided_apis()));
        assert!(OperatorSet::new().provided_apis().is_empty());
    }

    #[test]
    fn test_for_package() {
        let set: OperatorSet = vec![Entry::new("etcdoperator.v0.9.2").with_source_info(
            OperatorSourceInfo::new("etcd", "alpha", SourceKey::new("community", "olm")),
        )]
        .into_iter()
        .collect();

        assert_eq!(set.for_package("etcd").map(|e| e.name.as_str()), Some("etcdoperator.v0.9.2"));
        assert!(set.for_package("prometheus").is_none());
    }
}
