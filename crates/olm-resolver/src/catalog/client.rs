use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::local::LocalCatalog;
use super::model::{Bundle, ChannelInfo, PackageInfo};
use super::remote::RemoteCatalog;
use crate::Result;

/// Query access to one catalog.
///
/// Clients only list what a catalog publishes; selecting between the
/// listed bundles is the resolver's job.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn list_packages(&self) -> Result<Vec<PackageInfo>>;

    /// Channels of `package`; an unknown package has none
    async fn list_channels(&self, package: &str) -> Result<Vec<ChannelInfo>>;

    /// Bundles published in one channel of `package`
    async fn list_bundles(&self, package: &str, channel: &str) -> Result<Vec<Bundle>>;
}

/// How to reach a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CatalogConfig {
    /// A catalog document on disk
    Local { path: PathBuf },
    /// A catalog served over HTTP
    Remote { url: String },
}

impl CatalogConfig {
    pub fn build(&self) -> Result<Arc<dyn CatalogClient>> {
        Ok(match self {
            CatalogConfig::Local { path } => Arc::new(LocalCatalog::from_path(path)?),
            CatalogConfig::Remote { url } => Arc::new(RemoteCatalog::new(url)?),
        })
    }
}
