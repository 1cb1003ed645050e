use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of one catalog source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceKey {
    pub name: String,
    pub namespace: String,
}

impl SourceKey {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    /// Parse the `name/namespace` form used on the command line
    pub fn parse(s: &str) -> Option<Self> {
        let (name, namespace) = s.split_once('/')?;
        if name.is_empty() || namespace.is_empty() {
            return None;
        }
        Some(Self::new(name, namespace))
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.namespace)
    }
}

/// Where a candidate comes from: package, channel and catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorSourceInfo {
    pub package: String,
    pub channel: String,
    pub catalog: SourceKey,
    /// Whether `channel` is the package's default channel
    #[serde(default)]
    pub default_channel: bool,
}

impl OperatorSourceInfo {
    pub fn new(package: impl Into<String>, channel: impl Into<String>, catalog: SourceKey) -> Self {
        Self {
            package: package.into(),
            channel: channel.into(),
            catalog,
            default_channel: false,
        }
    }

    pub fn with_default_channel(mut self, default_channel: bool) -> Self {
        self.default_channel = default_channel;
        self
    }
}

impl fmt::Display for OperatorSourceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} in {}/{}",
            self.package, self.channel, self.catalog.name, self.catalog.namespace
        )
    }
}
