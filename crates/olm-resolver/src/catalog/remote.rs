use async_trait::async_trait;
use serde::de::DeserializeOwned;
use url::Url;

use super::client::CatalogClient;
use super::model::{Bundle, ChannelInfo, PackageInfo};
use crate::{Error, Result};

/// A catalog queried over HTTP.
///
/// The server exposes `GET {base}/packages`,
/// `GET {base}/packages/{package}/channels` and
/// `GET {base}/packages/{package}/channels/{channel}/bundles`, each
/// answering with a JSON list.
#[derive(Debug, Clone)]
pub struct RemoteCatalog {
    client: reqwest::Client,
    base: String,
}

impl RemoteCatalog {
    pub fn new(url: &str) -> Result<Self> {
        let parsed = Url::parse(url).map_err(|e| Error::InvalidCatalog(format!("{}: {}", url, e)))?;
        if parsed.cannot_be_a_base() {
            return Err(Error::InvalidCatalog(format!("{}: not a base url", url)));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            base: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn channels_url(&self, package: &str) -> String {
        format!("{}/packages/{}/channels", self.base, urlencoding::encode(package))
    }

    fn bundles_url(&self, package: &str, channel: &str) -> String {
        format!("{}/{}/bundles", self.channels_url(package), urlencoding::encode(channel))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .header("User-Agent", format!("olm-resolver/{}", env!("CARGO_PKG_VERSION")))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl CatalogClient for RemoteCatalog {
    async fn list_packages(&self) -> Result<Vec<PackageInfo>> {
        self.get_json(&format!("{}/packages", self.base)).await
    }

    async fn list_channels(&self, package: &str) -> Result<Vec<ChannelInfo>> {
        self.get_json(&self.channels_url(package)).await
    }

    async fn list_bundles(&self, package: &str, channel: &str) -> Result<Vec<Bundle>> {
        self.get_json(&self.bundles_url(package, channel)).await
    }
}
