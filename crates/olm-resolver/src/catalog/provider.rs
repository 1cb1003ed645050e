use std::collections::BTreeMap;
use std::sync::Arc;

use log::warn;
use serde::{Deserialize, Serialize};

use super::client::CatalogClient;
use crate::operator::SourceKey;

/// Supplies the catalogs visible to a set of namespaces.
pub trait SourceProvider: Send + Sync {
    fn clients_for_namespaces(&self, namespaces: &[String]) -> BTreeMap<SourceKey, Arc<dyn CatalogClient>>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Catalogs in this namespace are visible from every namespace
    #[serde(default)]
    pub global_namespace: Option<String>,
}

/// A [`SourceProvider`] over explicitly registered catalogs.
///
/// The first registration of a source key wins. Later registrations of the
/// same key are logged and remembered but never replace it.
#[derive(Default)]
pub struct SourceRegistry {
    config: RegistryConfig,
    sources: BTreeMap<SourceKey, Arc<dyn CatalogClient>>,
    duplicates: Vec<SourceKey>,
}

impl SourceRegistry {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Register a catalog; returns false if `key` was already registered
    pub fn register(&mut self, key: SourceKey, client: Arc<dyn CatalogClient>) -> bool {
        if self.sources.contains_key(&key) {
            warn!("catalog source {} is already registered, ignoring duplicate", key);
            self.duplicates.push(key);
            return false;
        }
        self.sources.insert(key, client);
        true
    }

    /// Source keys registered more than once, in registration order
    pub fn duplicates(&self) -> &[SourceKey] {
        &self.duplicates
    }

    pub fn contains(&self, key: &SourceKey) -> bool {
        self.sources.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    fn visible(&self, key: &SourceKey, namespaces: &[String]) -> bool {
        namespaces.iter().any(|ns| ns == &key.namespace)
            || self.config.global_namespace.as_deref() == Some(key.namespace.as_str())
    }
}

impl SourceProvider for SourceRegistry {
    fn clients_for_namespaces(&self, namespaces: &[String]) -> BTreeMap<SourceKey, Arc<dyn CatalogClient>> {
        self.sources
            .iter()
            .filter(|(key, _)| self.visible(key, namespaces))
            .map(|(key, client)| (key.clone(), Arc::clone(client)))
            .collect()
    }
}
