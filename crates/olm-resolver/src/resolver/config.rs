use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::policy::Policy;
use crate::capability::{CapabilityKey, CapabilitySet};

/// What to do with a required capability no candidate provides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExternalCapabilityPolicy {
    /// The requirement fails resolution
    #[default]
    Unsatisfiable,
    /// The requirement holds if the cluster already serves the capability
    ExternallySatisfied,
}

/// Resolver settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub external_capabilities: ExternalCapabilityPolicy,
    /// Capabilities the cluster serves outside the managed operators
    pub cluster_capabilities: CapabilitySet,
    /// Wall-clock budget for one solve, in milliseconds
    pub solve_timeout_ms: Option<u64>,
    pub policy: Policy,
}

impl ResolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn external_capabilities(mut self, policy: ExternalCapabilityPolicy) -> Self {
        self.external_capabilities = policy;
        self
    }

    pub fn cluster_capabilities(mut self, capabilities: CapabilitySet) -> Self {
        self.cluster_capabilities = capabilities.strip_plural();
        self
    }

    pub fn solve_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.solve_timeout_ms = timeout.map(|t| t.as_millis() as u64);
        self
    }

    pub fn policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.solve_timeout_ms.map(Duration::from_millis)
    }

    /// Whether a requirement on `capability` holds without any provider
    pub fn externally_satisfied(&self, capability: &CapabilityKey) -> bool {
        self.external_capabilities == ExternalCapabilityPolicy::ExternallySatisfied
            && self.cluster_capabilities.contains(capability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ResolverConfig::default();
        assert_eq!(config.external_capabilities, ExternalCapabilityPolicy::Unsatisfiable);
        assert_eq!(config.timeout(), None);
        assert!(config.policy.prefer_channel_head);
    }

    #[test]
    fn test_externally_satisfied() {
        let key = CapabilityKey::new("monitoring.coreos.com", "v1", "ServiceMonitor");
        let cluster: CapabilitySet = vec![key.clone().with_plural("servicemonitors")].into();

        let config = ResolverConfig::new().cluster_capabilities(cluster);
        assert!(!config.externally_satisfied(&key));

        let config = config.external_capabilities(ExternalCapabilityPolicy::ExternallySatisfied);
        assert!(config.externally_satisfied(&key));
        assert!(!config.externally_satisfied(&CapabilityKey::new("other.io", "v1", "Other")));
    }

    #[test]
    fn test_from_json() {
        let config: ResolverConfig = serde_json::from_str(
            r#"{
                "external_capabilities": "externally_satisfied",
                "cluster_capabilities": [{"group": "", "version": "v1", "kind": "ConfigMap"}],
                "solve_timeout_ms": 5000,
                "policy": {"prefer_default_channel": false}
            }"#,
        )
        .unwrap();

        assert_eq!(config.timeout(), Some(Duration::from_secs(5)));
        assert!(config.externally_satisfied(&CapabilityKey::new("", "v1", "ConfigMap")));
        assert!(!config.policy.prefer_default_channel);
        assert!(config.policy.prefer_channel_head);
    }
}
