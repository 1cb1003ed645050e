//! Operator dependency resolution.
//!
//! Given the operators installed in a set of namespaces, the subscriptions
//! declared for them and the catalogs visible to those namespaces, the
//! [`SatResolver`] selects a set of operators in which every required
//! capability has a provider, no capability has two providers, and every
//! subscription is served from its channel and source.
//!
//! ```ignore
//! use olm_resolver::catalog::{LocalCatalog, SourceRegistry};
//! use olm_resolver::resolver::{ResolverConfig, SatResolver, Subscription};
//!
//! let mut registry = SourceRegistry::default();
//! registry.register(key, Arc::new(LocalCatalog::from_path("catalog.json")?));
//!
//! let resolver = SatResolver::new(Arc::new(registry), ResolverConfig::default());
//! let selected = resolver
//!     .solve_operators(&namespaces, &installed, &subscriptions, &cancel)
//!     .await?;
//! ```

pub mod capability;
pub mod catalog;
mod error;
pub mod operator;
pub mod resolver;
pub mod sat;

pub use capability::{CapabilityKey, CapabilitySet};
pub use error::{Error, Result};
pub use operator::{Entry, MultiOwnerSet, OperatorSet, OperatorSourceInfo, SourceKey};
pub use resolver::{ResolutionError, ResolverConfig, SatResolver, Subscription};
