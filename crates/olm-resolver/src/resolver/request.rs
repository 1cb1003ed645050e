use std::fmt;

use serde::{Deserialize, Serialize};

use crate::operator::{Entry, OperatorSet, SourceKey};

/// A declaration that a package should be installed and kept updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub name: String,
    pub package: String,
    /// Channel to follow; any channel when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// Catalog to install from; any visible catalog when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceKey>,
    /// Bundle to start from when the package is not installed yet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starting_csv: Option<String>,
}

impl Subscription {
    pub fn new(name: impl Into<String>, package: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            package: package.into(),
            channel: None,
            source: None,
            starting_csv: None,
        }
    }

    pub fn in_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    pub fn from_source(mut self, source: SourceKey) -> Self {
        self.source = Some(source);
        self
    }

    pub fn starting_at(mut self, csv: impl Into<String>) -> Self {
        self.starting_csv = Some(csv.into());
        self
    }

    /// Whether `entry` belongs to this subscription's package, channel and source
    pub fn allows(&self, entry: &Entry) -> bool {
        let Some(info) = &entry.source_info else {
            return false;
        };
        info.package == self.package
            && self.channel.as_ref().map_or(true, |c| c == &info.channel)
            && self.source.as_ref().map_or(true, |s| s == &info.catalog)
    }
}

impl fmt::Display for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}", self.name, self.package)?;
        if let Some(channel) = &self.channel {
            write!(f, "/{}", channel)?;
        }
        if let Some(source) = &self.source {
            write!(f, " in {}", source)?;
        }
        f.write_str(")")
    }
}

/// Everything one resolution starts from besides the catalogs.
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub installed: OperatorSet,
    pub subscriptions: Vec<Subscription>,
}

impl Request {
    pub fn new(installed: OperatorSet, subscriptions: Vec<Subscription>) -> Self {
        Self {
            installed,
            subscriptions,
        }
    }

    /// Subscriptions ordered by package, then name
    pub fn sorted_subscriptions(&self) -> Vec<&Subscription> {
        let mut sorted: Vec<&Subscription> = self.subscriptions.iter().collect();
        sorted.sort_by(|a, b| a.package.cmp(&b.package).then_with(|| a.name.cmp(&b.name)));
        sorted
    }

    /// Catalogs named by any subscription
    pub fn subscribed_sources(&self) -> std::collections::BTreeSet<SourceKey> {
        self.subscriptions.iter().filter_map(|s| s.source.clone()).collect()
    }
}
