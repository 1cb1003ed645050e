use std::path::Path;

use async_trait::async_trait;

use super::client::CatalogClient;
use super::model::{Bundle, CatalogDocument, CatalogPackage, ChannelInfo, PackageInfo};
use crate::Result;

/// A catalog held in memory, usually loaded from a JSON document.
#[derive(Debug, Clone, Default)]
pub struct LocalCatalog {
    document: CatalogDocument,
}

impl LocalCatalog {
    pub fn new(document: CatalogDocument) -> Self {
        Self { document }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn document(&self) -> &CatalogDocument {
        &self.document
    }

    fn package(&self, name: &str) -> Option<&CatalogPackage> {
        self.document.packages.iter().find(|p| p.name == name)
    }
}

#[async_trait]
impl CatalogClient for LocalCatalog {
    async fn list_packages(&self) -> Result<Vec<PackageInfo>> {
        Ok(self
            .document
            .packages
            .iter()
            .map(CatalogPackage::info)
            .collect())
    }

    async fn list_channels(&self, package: &str) -> Result<Vec<ChannelInfo>> {
        Ok(self
            .package(package)
            .map(|p| p.channels.iter().map(|c| c.info()).collect())
            .unwrap_or_default())
    }

    async fn list_bundles(&self, package: &str, channel: &str) -> Result<Vec<Bundle>> {
        Ok(self
            .package(package)
            .and_then(|p| p.channels.iter().find(|c| c.name == channel))
            .map(|c| c.bundles.clone())
            .unwrap_or_default())
    }
}
