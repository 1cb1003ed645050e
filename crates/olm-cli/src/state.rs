//! Cluster state and catalog arguments read from the command line.

use std::path::Path;

use anyhow::{bail, Context, Result};
use olm_resolver::{Entry, OperatorSet, SourceKey, Subscription};
use serde::{Deserialize, Serialize};

/// What is installed and what is asked for, as read from a state file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterState {
    #[serde(default)]
    pub installed: Vec<Entry>,
    #[serde(default)]
    pub subscriptions: Vec<Subscription>,
}

impl ClusterState {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("Failed to parse state file {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn installed_set(&self) -> OperatorSet {
        self.installed.iter().cloned().collect()
    }
}

/// Split a `NAME/NAMESPACE=VALUE` argument into its source key and value
pub fn parse_source_arg(arg: &str) -> Result<(SourceKey, String)> {
    let Some((key, value)) = arg.split_once('=') else {
        bail!("expected NAME/NAMESPACE=VALUE, got '{}'", arg);
    };
    let Some(key) = SourceKey::parse(key) else {
        bail!("invalid catalog source '{}', expected NAME/NAMESPACE", key);
    };
    if value.is_empty() {
        bail!("missing location for catalog source {}", key);
    }
    Ok((key, value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_source_arg() {
        let (key, value) = parse_source_arg("community/olm=./catalog.json").unwrap();
        assert_eq!(key, SourceKey::new("community", "olm"));
        assert_eq!(value, "./catalog.json");

        let (_, url) = parse_source_arg("certified/olm=http://catalog.local/api?x=1").unwrap();
        assert_eq!(url, "http://catalog.local/api?x=1");
    }

    #[test]
    fn test_parse_source_arg_rejects_malformed() {
        assert!(parse_source_arg("community=./catalog.json").is_err());
        assert!(parse_source_arg("community/olm").is_err());
        assert!(parse_source_arg("community/olm=").is_err());
    }

    #[test]
    fn test_state_from_json() {
        let state = ClusterState::from_json(
            r#"{
                "installed": [{"name": "etcdoperator.v0.9.2", "version": "0.9.2"}],
                "subscriptions": [{"name": "etcd-sub", "package": "etcd", "channel": "alpha"}]
            }"#,
        )
        .unwrap();

        assert_eq!(state.installed_set().keys().collect::<Vec<_>>(), vec!["etcdoperator.v0.9.2"]);
        assert_eq!(state.subscriptions[0].package, "etcd");
        assert_eq!(state.subscriptions[0].channel.as_deref(), Some("alpha"));
    }

    #[test]
    fn test_state_load() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{}}").unwrap();

        let state = ClusterState::load(file.path()).unwrap();
        assert!(state.installed.is_empty());
        assert!(state.subscriptions.is_empty());

        assert!(ClusterState::load(Path::new("/nonexistent/state.json")).is_err());
    }
}
