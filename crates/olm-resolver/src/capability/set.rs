use std::collections::BTreeSet;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::key::CapabilityKey;

/// A set of capability keys.
///
/// Keys are compared on group/version/kind only, so two keys that differ
/// only in their plural form are the same element. The default value is
/// the empty set; there is no separate "missing" state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilitySet {
    keys: BTreeSet<CapabilityKey>,
}

impl CapabilitySet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a key, returning false if an equal key was already present.
    ///
    /// An existing key keeps its plural form.
    pub fn insert(&mut self, key: CapabilityKey) -> bool {
        self.keys.insert(key)
    }

    pub fn remove(&mut self, key: &CapabilityKey) -> bool {
        self.keys.remove(key)
    }

    pub fn contains(&self, key: &CapabilityKey) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Iterate keys in (group, version, kind) order
    pub fn iter(&self) -> impl Iterator<Item = &CapabilityKey> + '_ {
        self.keys.iter()
    }

    /// Union of this set with every set in `others`.
    pub fn union(&self, others: &[&CapabilitySet]) -> CapabilitySet {
        let mut result = self.clone();
        for other in others {
            for key in other.iter() {
                if !result.contains(key) {
                    result.insert(key.clone());
                }
            }
        }
        result
    }

    /// Keys present in this set and in every set in `others`.
    ///
    /// With no other sets the result is this set itself. Duplicate entries in
    /// `others` do not change the result; any empty entry empties it.
    pub fn intersection(&self, others: &[&CapabilitySet]) -> CapabilitySet {
        self.keys
            .iter()
            .filter(|key| others.iter().all(|other| other.contains(key)))
            .cloned()
            .collect()
    }

    /// Keys in this set that are not in `other`
    pub fn difference(&self, other: &CapabilitySet) -> CapabilitySet {
        self.keys
            .iter()
            .filter(|key| !other.contains(key))
            .cloned()
            .collect()
    }

    /// True if every key of this set is in `other`. The empty set is a
    /// subset of every set.
    pub fn is_subset(&self, other: &CapabilitySet) -> bool {
        self.keys.iter().all(|key| other.contains(key))
    }

    /// An equivalent set with every plural form cleared.
    pub fn strip_plural(&self) -> CapabilitySet {
        self.keys.iter().map(CapabilityKey::without_plural).collect()
    }

    /// Decode a comma separated list of `<kind>.<version>.<group>` tokens.
    ///
    /// Spaces are removed everywhere, inside fields too. Tokens that do not
    /// parse are dropped, so malformed input yields a smaller (possibly
    /// empty) set rather than an error.
    pub fn from_gvk_string(s: &str) -> CapabilitySet {
        let compact: String = s.chars().filter(|c| *c != ' ').collect();
        compact
            .split(',')
            .filter_map(CapabilityKey::parse_gvk)
            .collect()
    }
}

/// Encodes as the sorted textual forms of the keys, joined by commas.
impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut encoded: Vec<String> = self.keys.iter().map(|k| k.to_string()).collect();
        encoded.sort();
        f.write_str(&encoded.join(","))
    }
}

impl FromStr for CapabilitySet {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_gvk_string(s))
    }
}

impl FromIterator<CapabilityKey> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = CapabilityKey>>(iter: I) -> Self {
        let mut set = CapabilitySet::new();
        for key in iter {
            set.insert(key);
        }
        set
    }
}

impl Extend<CapabilityKey> for CapabilitySet {
    fn extend<I: IntoIterator<Item = CapabilityKey>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl IntoIterator for CapabilitySet {
    type Item = CapabilityKey;
    type IntoIter = std::collections::btree_set::IntoIter<CapabilityKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.into_iter()
    }
}

impl<'a> IntoIterator for &'a CapabilitySet {
    type Item = &'a CapabilityKey;
    type IntoIter = std::collections::btree_set::Iter<'a, CapabilityKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}

impl From<Vec<CapabilityKey>> for CapabilitySet {
    fn from(keys: Vec<CapabilityKey>) -> Self {
        keys.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(group: &str, version: &str, kind: &str) -> CapabilityKey {
        CapabilityKey::new(group, version, kind)
    }

    fn set(keys: &[(&str, &str, &str)]) -> CapabilitySet {
        keys.iter().map(|(g, v, k)| key(g, v, k)).collect()
    }

    #[test]
    fn test_decode_empty_and_garbage() {
        assert!(CapabilitySet::from_gvk_string("").is_empty());
        assert!(CapabilitySet::from_gvk_string(",,,,,alkjahsdfjlh!@#$%").is_empty());
        assert!(CapabilitySet::from_gvk_string("this-is.not-good").is_empty());
        assert!(CapabilitySet::from_gvk_string("this-is.not-good,thisisnoteither").is_empty());
    }

    #[test]
    fn test_decode_good_tokens() {
        assert_eq!(
            CapabilitySet::from_gvk_string("Goose.v1alpha1.birds.com"),
            set(&[("birds.com", "v1alpha1", "Goose")])
        );
        assert_eq!(
            CapabilitySet::from_gvk_string("Goose.v1alpha1.birds.com,Moose.v1alpha1.mammals.com"),
            set(&[("birds.com", "v1alpha1", "Goose"), ("mammals.com", "v1alpha1", "Moose")])
        );
    }

    #[test]
    fn test_decode_drops_only_bad_tokens() {
        assert_eq!(
            CapabilitySet::from_gvk_string("Goose.v1alpha1.birds.com,garbage"),
            set(&[("birds.com", "v1alpha1", "Goose")])
        );
        assert_eq!(
            CapabilitySet::from_gvk_string("Goose.v1alpha1.birds.com,Moose.v1alpha1,Goat,Egret.v1beta1.birds.com"),
            set(&[("birds.com", "v1alpha1", "Goose"), ("birds.com", "v1beta1", "Egret")])
        );
    }

    #[test]
    fn test_decode_ignores_spaces() {
        let parsed: CapabilitySet = "Goose.v1alpha1.birds.com, Moose.v1.mammals.com".parse().unwrap();
        assert_eq!(parsed.len(), 2);
        assert!(parsed.contains(&key("mammals.com", "v1", "Moose")));
    }

    #[test]
    fn test_spaces_inside_fields_do_not_round_trip() {
        let original: CapabilitySet = vec![key("birds.com", "v1", "My Kind")].into();
        assert_eq!(original.to_string(), "My Kind.v1.birds.com");

        let decoded = CapabilitySet::from_gvk_string(&original.to_string());
        assert_eq!(decoded, CapabilitySet::from(vec![key("birds.com", "v1", "MyKind")]));
        assert_ne!(decoded, original);
    }

    #[test]
    fn test_encode_sorted() {
        assert_eq!(CapabilitySet::new().to_string(), "");
        assert_eq!(
            set(&[("birds.com", "v1alpha1", "Goose"), ("birds.com", "v1alpha1", "Egret")]).to_string(),
            "Egret.v1alpha1.birds.com,Goose.v1alpha1.birds.com"
        );
        assert_eq!(
            set(&[
                ("birds.com", "v1alpha1", ""),
                ("birds.com", "v1alpha1", "Goose"),
                ("birds.com", "v1alpha1", "Egret"),
            ])
            .to_string(),
            ".v1alpha1.birds.com,Egret.v1alpha1.birds.com,Goose.v1alpha1.birds.com"
        );
    }

    #[test]
    fn test_round_trip_strips_plural() {
        let original: CapabilitySet = vec![
            key("birds.com", "v1alpha1", "Goose").with_plural("geese"),
            key("mammals.com", "v1", "Moose").with_plural("moose"),
        ]
        .into();

        let decoded = CapabilitySet::from_gvk_string(&original.to_string());
        assert_eq!(decoded, original.strip_plural());
        assert!(decoded.iter().all(|k| k.plural.is_empty()));
    }

    #[test]
    fn test_union() {
        let empty = CapabilitySet::new();
        assert!(empty.union(&[]).is_empty());
        assert!(empty.union(&[&CapabilitySet::new()]).is_empty());

        let left = set(&[("birds.com", "v1alpha1", "Goose"), ("birds.com", "v1beta1", "Egret")]);
        let a = set(&[("birds.com", "v1alpha1", "Goose"), ("birds.com", "v1beta1", "Crow")]);
        let b = set(&[("mammals.com", "v1alpha1", "Moose"), ("birds.com", "v1beta1", "Egret")]);
        let c = set(&[("mammals.com", "v1beta1", "Goat")]);

        let union = left.union(&[&a, &CapabilitySet::new(), &b, &c]);
        assert_eq!(
            union,
            set(&[
                ("birds.com", "v1alpha1", "Goose"),
                ("birds.com", "v1beta1", "Egret"),
                ("birds.com", "v1beta1", "Crow"),
                ("mammals.com", "v1alpha1", "Moose"),
                ("mammals.com", "v1beta1", "Goat"),
            ])
        );
        assert_eq!(left.union(&[]), left);
        assert_eq!(a.union(&[&b]), b.union(&[&a]));
    }

    #[test]
    fn test_intersection() {
        let goose = set(&[("birds.com", "v1alpha1", "Goose")]);
        let goose_moose = set(&[("birds.com", "v1alpha1", "Goose"), ("mammals.com", "v1alpha1", "Moose")]);
        let moose = set(&[("mammals.com", "v1alpha1", "Moose")]);

        assert!(CapabilitySet::new().intersection(&[]).is_empty());
        assert!(CapabilitySet::new().intersection(&[&goose]).is_empty());
        assert!(goose.intersection(&[&CapabilitySet::new()]).is_empty());

        assert_eq!(goose.intersection(&[&goose_moose]), goose);
        assert_eq!(goose_moose.intersection(&[&goose]), goose);
        assert_eq!(goose.intersection(&[&goose_moose, &goose_moose]), goose);
        assert!(goose.intersection(&[&moose, &goose]).is_empty());

        // Zero others is the identity
        assert_eq!(goose_moose.intersection(&[]), goose_moose);
        assert_eq!(goose_moose.intersection(&[&goose_moose]), goose_moose);
    }

    #[test]
    fn test_difference() {
        let goose = set(&[("birds.com", "v1alpha1", "Goose")]);
        let all = set(&[
            ("birds.com", "v1alpha1", "Goose"),
            ("mammals.com", "v1alpha1", "Moose"),
            ("mammals.com", "v1alpha1", "Goat"),
        ]);
        let other = set(&[("mammals.com", "v1alpha1", "Moose"), ("mammals.com", "v1alpha2", "Gopher")]);

        assert!(CapabilitySet::new().difference(&CapabilitySet::new()).is_empty());
        assert_eq!(goose.difference(&CapabilitySet::new()), goose);
        assert!(CapabilitySet::new().difference(&goose).is_empty());
        assert!(all.difference(&all).is_empty());
        assert_eq!(
            all.difference(&other),
            set(&[("birds.com", "v1alpha1", "Goose"), ("mammals.com", "v1alpha1", "Goat")])
        );
    }

    #[test]
    fn test_difference_ignores_plural() {
        let left: CapabilitySet = vec![key("birds.com", "v1", "Goose").with_plural("geese")].into();
        let right = set(&[("birds.com", "v1", "Goose")]);
        assert!(left.difference(&right).is_empty());
        assert_eq!(left.intersection(&[&right]).len(), 1);
    }

    #[test]
    fn test_is_subset() {
        let goose = set(&[("birds.com", "v1alpha1", "Goose")]);
        let both = set(&[("birds.com", "v1alpha1", "Goose"), ("mammals.com", "v1alpha1", "Moose")]);

        assert!(CapabilitySet::new().is_subset(&CapabilitySet::new()));
        assert!(CapabilitySet::new().is_subset(&goose));
        assert!(goose.is_subset(&goose));
        assert!(goose.is_subset(&both));
        assert!(!both.is_subset(&goose));
        assert!(!both.is_subset(&CapabilitySet::new()));
    }

    #[test]
    fn test_strip_plural() {
        assert!(CapabilitySet::new().strip_plural().is_empty());

        let with_plurals: CapabilitySet = vec![
            key("birds.com", "v1alpha1", "Goose").with_plural("Geese"),
            key("mammals.com", "v1alpha1", "Moose").with_plural("Moose"),
        ]
        .into();
        let stripped = with_plurals.strip_plural();
        assert_eq!(stripped.len(), 2);
        assert!(stripped.iter().all(|k| k.plural.is_empty()));
    }

    #[test]
    fn test_serde_list() {
        let original = set(&[("birds.com", "v1", "Goose")]);
        let json = serde_json::to_string(&original).unwrap();
        assert_eq!(json, r#"[{"group":"birds.com","version":"v1","kind":"Goose"}]"#);
        let decoded: CapabilitySet = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, original);
    }
}
