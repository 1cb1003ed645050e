use semver::Version;
use serde::{Deserialize, Serialize};

use crate::capability::CapabilitySet;
use crate::operator::{Entry, OperatorSourceInfo, PackageDependency, SourceKey};

/// A catalog document: every package a source publishes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogDocument {
    #[serde(default)]
    pub packages: Vec<CatalogPackage>,
}

/// A package as listed by a catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub name: String,
    #[serde(default)]
    pub default_channel: Option<String>,
}

impl PackageInfo {
    /// Source information for a bundle of this package in `channel`
    pub fn source_info(&self, catalog: &SourceKey, channel: &str) -> OperatorSourceInfo {
        OperatorSourceInfo::new(&self.name, channel, catalog.clone())
            .with_default_channel(self.default_channel.as_deref() == Some(channel))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogPackage {
    pub name: String,
    #[serde(default)]
    pub default_channel: Option<String>,
    #[serde(default)]
    pub channels: Vec<CatalogChannel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogChannel {
    pub name: String,
    /// Bundle at the tip of the channel; derived from the bundles when absent
    #[serde(default)]
    pub head: Option<String>,
    #[serde(default)]
    pub bundles: Vec<Bundle>,
}

impl CatalogPackage {
    pub fn info(&self) -> PackageInfo {
        PackageInfo {
            name: self.name.clone(),
            default_channel: self.default_channel.clone(),
        }
    }
}

impl CatalogChannel {
    pub fn info(&self) -> ChannelInfo {
        ChannelInfo {
            name: self.name.clone(),
            head: self.head.clone().or_else(|| derive_head(&self.bundles)),
        }
    }
}

/// Name and head of one channel of a package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub name: String,
    #[serde(default)]
    pub head: Option<String>,
}

/// A package version as published in a channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    pub name: String,
    #[serde(default)]
    pub version: Option<Version>,
    #[serde(default)]
    pub replaces: Option<String>,
    #[serde(default)]
    pub skips: Vec<String>,
    #[serde(default)]
    pub provided_apis: CapabilitySet,
    #[serde(default)]
    pub required_apis: CapabilitySet,
    #[serde(default)]
    pub dependencies: Vec<PackageDependency>,
    #[serde(default)]
    pub bundle_path: String,
}

impl Bundle {
    /// Turn a published bundle into a resolvable entry
    pub fn into_entry(self, info: OperatorSourceInfo) -> Entry {
        Entry {
            name: self.name,
            version: self.version,
            replaces: self.replaces.into_iter().collect(),
            skips: self.skips,
            provided_apis: self.provided_apis.strip_plural(),
            required_apis: self.required_apis.strip_plural(),
            dependencies: self.dependencies,
            bundle_path: self.bundle_path,
            source_info: Some(info),
        }
    }
}

/// The bundle no other bundle in the channel replaces or skips.
///
/// Ties go to the lexically first name.
pub fn derive_head(bundles: &[Bundle]) -> Option<String> {
    let mut heads: Vec<&str> = bundles
        .iter()
        .filter(|candidate| {
            !bundles.iter().any(|b| {
                b.replaces.as_deref() == Some(candidate.name.as_str())
                    || b.skips.iter().any(|s| s == &candidate.name)
            })
        })
        .map(|b| b.name.as_str())
        .collect();
    heads.sort();
    heads.first().map(|name| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle(name: &str, replaces: Option<&str>) -> Bundle {
        Bundle {
            name: name.to_string(),
            replaces: replaces.map(String::from),
            ..Bundle::default()
        }
    }

    #[test]
    fn test_derive_head_follows_replaces() {
        let bundles = vec![bundle("v1", None), bundle("v3", Some("v2")), bundle("v2", Some("v1"))];
        assert_eq!(derive_head(&bundles), Some("v3".to_string()));
    }

    #[test]
    fn test_derive_head_counts_skips() {
        let mut v3 = bundle("v3", Some("v1"));
        v3.skips.push("v2".to_string());
        let bundles = vec![bundle("v1", None), bundle("v2", Some("v1")), v3];
        assert_eq!(derive_head(&bundles), Some("v3".to_string()));
    }

    #[test]
    fn test_derive_head_empty_channel() {
        assert_eq!(derive_head(&[]), None);
    }

    #[test]
    fn test_channel_info_prefers_published_head() {
        let channel = CatalogChannel {
            name: "stable".to_string(),
            head: Some("v1".to_string()),
            bundles: vec![bundle("v1", None), bundle("v2", Some("v1"))],
        };
        assert_eq!(channel.info().head, Some("v1".to_string()));
    }

    #[test]
    fn test_into_entry() {
        let package = CatalogPackage {
            name: "etcd".to_string(),
            default_channel: Some("alpha".to_string()),
            channels: Vec::new(),
        };
        let catalog = SourceKey::new("community", "olm");

        let entry = bundle("etcdoperator.v0.9.2", Some("etcdoperator.v0.9.0"))
            .into_entry(package.info().source_info(&catalog, "alpha"));

        assert_eq!(entry.replaces, vec!["etcdoperator.v0.9.0".to_string()]);
        assert_eq!(entry.package(), Some("etcd"));
        assert!(entry.is_default_channel());

        let other = package.info().source_info(&catalog, "beta");
        assert!(!other.default_channel);
    }

    #[test]
    fn test_document_from_json() {
        let doc: CatalogDocument = serde_json::from_str(
            r#"{
                "packages": [{
                    "name": "etcd",
                    "default_channel": "alpha",
                    "channels": [{
                        "name": "alpha",
                        "bundles": [{
                            "name": "etcdoperator.v0.9.2",
                            "version": "0.9.2",
                            "provided_apis": [{"group": "etcd.database.coreos.com", "version": "v1beta2", "kind": "EtcdCluster", "plural": "etcdclusters"}],
                            "bundle_path": "quay.io/coreos/etcd-operator@sha256:abc"
                        }]
                    }]
                }]
            }"#,
        )
        .unwrap();

        let channel = &doc.packages[0].channels[0];
        assert_eq!(channel.info().head, Some("etcdoperator.v0.9.2".to_string()));
        assert_eq!(channel.bundles[0].provided_apis.iter().next().unwrap().plural, "etcdclusters");
    }
}
