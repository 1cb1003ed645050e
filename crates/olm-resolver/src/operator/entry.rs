use std::fmt;

use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};

use super::source_info::{OperatorSourceInfo, SourceKey};
use crate::capability::{CapabilityKey, CapabilitySet};

/// A package-level dependency: some entry of `package`, optionally within a
/// version range, must be selected alongside the dependent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDependency {
    pub package: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_range: Option<VersionReq>,
}

impl PackageDependency {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            version_range: None,
        }
    }

    pub fn with_range(mut self, range: VersionReq) -> Self {
        self.version_range = Some(range);
        self
    }

    /// Check whether `entry` satisfies this dependency.
    ///
    /// Entries without a version never satisfy a ranged dependency.
    pub fn matches(&self, entry: &Entry) -> bool {
        if entry.package() != Some(self.package.as_str()) {
            return false;
        }
        match (&self.version_range, &entry.version) {
            (None, _) => true,
            (Some(range), Some(version)) => range.matches(version),
            (Some(_), None) => false,
        }
    }
}

impl fmt::Display for PackageDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version_range {
            Some(range) => write!(f, "{} {}", self.package, range),
            None => f.write_str(&self.package),
        }
    }
}

/// One resolvable operator version.
///
/// Entries are built from catalog data (or from the installed state) for a
/// single resolution call and are not modified afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,
    /// Entries this one directly updates, forming the channel's update chain
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replaces: Vec<String>,
    /// Entries this one may also update from without being on the chain
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skips: Vec<String>,
    #[serde(default)]
    pub provided_apis: CapabilitySet,
    #[serde(default)]
    pub required_apis: CapabilitySet,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<PackageDependency>,
    /// Content locator, usually an image reference
    #[serde(default)]
    pub bundle_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_info: Option<OperatorSourceInfo>,
}

impl Entry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }

    pub fn replacing(mut self, name: impl Into<String>) -> Self {
        self.replaces.push(name.into());
        self
    }

    pub fn skipping(mut self, name: impl Into<String>) -> Self {
        self.skips.push(name.into());
        self
    }

    pub fn providing(mut self, key: CapabilityKey) -> Self {
        self.provided_apis.insert(key);
        self
    }

    pub fn requiring(mut self, key: CapabilityKey) -> Self {
        self.required_apis.insert(key);
        self
    }

    pub fn depending_on(mut self, dependency: PackageDependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn with_bundle_path(mut self, path: impl Into<String>) -> Self {
        self.bundle_path = path.into();
        self
    }

    pub fn with_source_info(mut self, info: OperatorSourceInfo) -> Self {
        self.source_info = Some(info);
        self
    }

    pub fn package(&self) -> Option<&str> {
        self.source_info.as_ref().map(|info| info.package.as_str())
    }

    pub fn channel(&self) -> Option<&str> {
        self.source_info.as_ref().map(|info| info.channel.as_str())
    }

    pub fn source_key(&self) -> Option<&SourceKey> {
        self.source_info.as_ref().map(|info| &info.catalog)
    }

    pub fn is_default_channel(&self) -> bool {
        self.source_info.as_ref().map(|info| info.default_channel).unwrap_or(false)
    }

    /// Whether this entry lists `name` as a replaces or skips predecessor
    pub fn updates_from(&self, name: &str) -> bool {
        self.replaces.iter().chain(self.skips.iter()).any(|n| n == name)
    }

    /// Identifier that is unique across sources and channels
    pub fn identifier(&self) -> String {
        match &self.source_info {
            Some(info) => format!("{} ({})", self.name, info),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identifier())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn etcd(version: &str) -> Entry {
        Entry::new(format!("etcdoperator.v{}", version))
            .with_version(Version::parse(version).unwrap())
            .with_source_info(OperatorSourceInfo::new("etcd", "alpha", SourceKey::new("community", "olm")))
    }

    #[test]
    fn test_accessors() {
        let entry = etcd("0.9.2");
        assert_eq!(entry.package(), Some("etcd"));
        assert_eq!(entry.channel(), Some("alpha"));
        assert_eq!(entry.source_key(), Some(&SourceKey::new("community", "olm")));
        assert!(!entry.is_default_channel());

        let bare = Entry::new("bare");
        assert_eq!(bare.package(), None);
        assert_eq!(bare.identifier(), "bare");
    }

    #[test]
    fn test_identifier_includes_source() {
        assert_eq!(etcd("0.9.2").identifier(), "etcdoperator.v0.9.2 (etcd/alpha in community/olm)");
    }

    #[test]
    fn test_updates_from() {
        let entry = etcd("0.9.4").replacing("etcdoperator.v0.9.2").skipping("etcdoperator.v0.9.3");
        assert!(entry.updates_from("etcdoperator.v0.9.2"));
        assert!(entry.updates_from("etcdoperator.v0.9.3"));
        assert!(!entry.updates_from("etcdoperator.v0.9.0"));
    }

    #[test]
    fn test_dependency_matches() {
        let dep = PackageDependency::new("etcd");
        assert!(dep.matches(&etcd("0.9.2")));

        let ranged = PackageDependency::new("etcd").with_range(VersionReq::parse(">=0.9.4").unwrap());
        assert!(!ranged.matches(&etcd("0.9.2")));
        assert!(ranged.matches(&etcd("0.9.4")));

        let other = PackageDependency::new("prometheus");
        assert!(!other.matches(&etcd("0.9.2")));

        let unversioned = Entry::new("etcdoperator")
            .with_source_info(OperatorSourceInfo::new("etcd", "alpha", SourceKey::new("community", "olm")));
        assert!(dep.matches(&unversioned));
        assert!(!ranged.matches(&unversioned));
    }

    #[test]
    fn test_entry_deserialize_defaults() {
        let entry: Entry = serde_json::from_str(
            r#"{"name": "etcdoperator.v0.9.2", "version": "0.9.2", "provided_apis": [{"group": "etcd.database.coreos.com", "version": "v1beta2", "kind": "EtcdCluster"}]}"#,
        )
        .unwrap();
        assert_eq!(entry.version, Some(Version::new(0, 9, 2)));
        assert_eq!(entry.provided_apis.len(), 1);
        assert!(entry.required_apis.is_empty());
        assert!(entry.source_info.is_none());
    }
}
