//! Catalog access.
//!
//! Catalogs publish packages, their channels and the bundles in each
//! channel. A [`SourceProvider`] decides which catalogs a set of namespaces
//! can see, and [`fetch`] lists all of them into a [`CatalogSnapshot`] the
//! resolver works from.

mod client;
mod local;
mod model;
mod provider;
mod remote;
mod snapshot;

pub use client::{CatalogClient, CatalogConfig};
pub use local::LocalCatalog;
pub use model::{derive_head, Bundle, CatalogChannel, CatalogDocument, CatalogPackage, ChannelInfo, PackageInfo};
pub use provider::{RegistryConfig, SourceProvider, SourceRegistry};
pub use remote::RemoteCatalog;
pub use snapshot::{fetch, CatalogSnapshot};
