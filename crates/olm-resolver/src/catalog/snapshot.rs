use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

use futures_util::future::try_join_all;
use log::debug;
use tokio_util::sync::CancellationToken;

use super::client::CatalogClient;
use super::model::{derive_head, Bundle, CatalogDocument, ChannelInfo, PackageInfo};
use super::provider::SourceProvider;
use crate::operator::{Entry, SourceKey};
use crate::{Error, Result};

/// Every candidate published by the catalogs of one resolution.
///
/// A snapshot is complete or it does not exist: fetching either lists every
/// visible catalog or fails.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    entries: Vec<Arc<Entry>>,
    /// Steps from the channel head, keyed by entry identifier
    head_distance: HashMap<String, u32>,
}

impl CatalogSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from catalog documents already in memory
    pub fn from_documents<'a>(documents: impl IntoIterator<Item = (SourceKey, &'a CatalogDocument)>) -> Self {
        let mut snapshot = Self::new();
        for (key, document) in documents {
            for package in &document.packages {
                let info = package.info();
                for channel in &package.channels {
                    snapshot.add_channel(&key, &info, &channel.info(), channel.bundles.clone());
                }
            }
        }
        snapshot
    }

    /// Add the bundles of one channel as candidates.
    ///
    /// A channel without a published head gets one derived from its bundles.
    pub fn add_channel(&mut self, catalog: &SourceKey, package: &PackageInfo, channel: &ChannelInfo, bundles: Vec<Bundle>) {
        let head = channel.head.clone().or_else(|| derive_head(&bundles));
        let distances = head_distances(head.as_deref(), &bundles);
        let unreachable = bundles.len() as u32;

        for bundle in bundles {
            let distance = distances.get(bundle.name.as_str()).copied().unwrap_or(unreachable);
            let entry = bundle.into_entry(package.source_info(catalog, &channel.name));
            self.head_distance.insert(entry.identifier(), distance);
            self.entries.push(Arc::new(entry));
        }
    }

    pub fn entries(&self) -> &[Arc<Entry>] {
        &self.entries
    }

    /// Distance of `entry` from the head of its channel; zero for unknown entries
    pub fn head_distance(&self, entry: &Entry) -> u32 {
        self.head_distance.get(&entry.identifier()).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Steps from `head` to each bundle along replaces and skips edges
fn head_distances(head: Option<&str>, bundles: &[Bundle]) -> HashMap<String, u32> {
    let by_name: HashMap<&str, &Bundle> = bundles.iter().map(|b| (b.name.as_str(), b)).collect();
    let mut distances: HashMap<String, u32> = HashMap::new();
    let mut queue = VecDeque::new();

    if let Some(head) = head {
        distances.insert(head.to_string(), 0);
        queue.push_back((head.to_string(), 0));
    }

    while let Some((name, distance)) = queue.pop_front() {
        let Some(bundle) = by_name.get(name.as_str()) else {
            continue;
        };
        for predecessor in bundle.replaces.iter().chain(bundle.skips.iter()) {
            if !distances.contains_key(predecessor) {
                distances.insert(predecessor.clone(), distance + 1);
                queue.push_back((predecessor.clone(), distance + 1));
            }
        }
    }
    distances
}

struct ChannelListing {
    catalog: SourceKey,
    package: PackageInfo,
    channel: ChannelInfo,
    bundles: Vec<Bundle>,
}

async fn list_source(catalog: &SourceKey, client: &dyn CatalogClient) -> Result<Vec<ChannelListing>> {
    let mut listings = Vec::new();
    for package in client.list_packages().await? {
        for channel in client.list_channels(&package.name).await? {
            let bundles = client.list_bundles(&package.name, &channel.name).await?;
            listings.push(ChannelListing {
                catalog: catalog.clone(),
                package: package.clone(),
                channel,
                bundles,
            });
        }
    }
    Ok(listings)
}

/// List every catalog visible to `namespaces`.
///
/// Sources are listed concurrently. The first failure, or cancellation of
/// `cancel`, aborts the whole fetch.
pub async fn fetch(
    provider: &dyn SourceProvider,
    namespaces: &[String],
    cancel: &CancellationToken,
) -> Result<CatalogSnapshot> {
    let clients: BTreeMap<SourceKey, Arc<dyn CatalogClient>> = provider.clients_for_namespaces(namespaces);
    debug!("fetching {} catalog sources for namespaces {:?}", clients.len(), namespaces);

    let fetches = clients.iter().map(|(key, client)| async move {
        list_source(key, client.as_ref())
            .await
            .map_err(|e| Error::fetch(key.clone(), e))
    });

    let sources = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(Error::Cancelled),
        res = try_join_all(fetches) => res?,
    };

    let mut snapshot = CatalogSnapshot::new();
    for listing in sources.into_iter().flatten() {
        snapshot.add_channel(&listing.catalog, &listing.package, &listing.channel, listing.bundles);
    }
    debug!("catalog snapshot holds {} candidates", snapshot.len());
    Ok(snapshot)
}
