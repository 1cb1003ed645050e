use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Identity of a typed API capability (group/version/kind).
///
/// The plural form is display metadata only: equality, hashing and ordering
/// look at group, version and kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapabilityKey {
    #[serde(default)]
    pub group: String,
    pub version: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub plural: String,
}

impl CapabilityKey {
    /// Create a key without a plural form
    pub fn new(group: impl Into<String>, version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
            plural: String::new(),
        }
    }

    /// Attach a plural form
    pub fn with_plural(mut self, plural: impl Into<String>) -> Self {
        self.plural = plural.into();
        self
    }

    /// Return a copy of this key with the plural form cleared
    pub fn without_plural(&self) -> Self {
        Self::new(self.group.clone(), self.version.clone(), self.kind.clone())
    }

    /// Parse a single `<kind>.<version>.<group>` token.
    ///
    /// The token is split into at most three parts, so the group keeps any
    /// dots it contains. Returns `None` unless there are three parts with a
    /// non-empty kind and version; the group may be empty (core API group).
    pub fn parse_gvk(token: &str) -> Option<Self> {
        let mut parts = token.splitn(3, '.');
        let kind = parts.next()?;
        let version = parts.next()?;
        let group = parts.next()?;

        if kind.is_empty() || version.is_empty() {
            return None;
        }

        Some(Self::new(group, version, kind))
    }

    fn identity(&self) -> (&str, &str, &str) {
        (&self.group, &self.version, &self.kind)
    }
}

impl PartialEq for CapabilityKey {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for CapabilityKey {}

impl Hash for CapabilityKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

impl PartialOrd for CapabilityKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CapabilityKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.identity().cmp(&other.identity())
    }
}

/// Renders the textual GVK form, `<kind>.<version>.<group>`.
impl fmt::Display for CapabilityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.kind, self.version, self.group)
    }
}
