use std::cmp::Ordering;
use std::collections::BTreeSet;

use semver::Version;
use serde::{Deserialize, Serialize};

use super::pool::{CandidateId, Pool};
use crate::operator::SourceKey;

/// Distances from the channel head are capped at this many steps
pub const MAX_HEAD_DISTANCE: u64 = 1023;

/// Soft rule weights of each preference tier for one pool.
///
/// Each tier outweighs every lower tier summed over the whole pool, so
/// solutions compare lexicographically tier by tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Weights {
    /// Cost of dropping an installed operator
    pub keep_installed: u64,
    /// Cost of a candidate from a catalog no subscription names
    pub subscription_source: u64,
    /// Cost of a candidate outside its package's default channel
    pub default_channel: u64,
    /// Cost of every operator that is not installed yet
    pub install: u64,
    /// Largest head distance any candidate is charged
    pub head_distance: u64,
}

impl Weights {
    pub fn new(policy: &Policy, pool: &Pool) -> Self {
        let head_distance = if policy.prefer_channel_head {
            pool.ids()
                .map(|id| u64::from(pool.candidate(id).head_distance))
                .max()
                .unwrap_or(0)
                .min(MAX_HEAD_DISTANCE)
        } else {
            0
        };

        // one soft rule of each tier per candidate at most
        let count = pool.len().max(1) as u64;
        let above = |lower: u64| count.saturating_mul(lower).saturating_add(1);

        let install = above(head_distance);
        let default_channel = above(install.saturating_add(head_distance));
        let subscription_source = above(default_channel.saturating_add(install).saturating_add(head_distance));
        let keep_installed = above(
            subscription_source
                .saturating_add(default_channel)
                .saturating_add(install)
                .saturating_add(head_distance),
        );

        Self {
            keep_installed,
            subscription_source,
            default_channel,
            install,
            head_distance,
        }
    }
}

/// Preferences between solutions that satisfy every hard constraint.
///
/// Keeping installed operators always outweighs every other preference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    /// Prefer candidates closer to the head of their channel
    pub prefer_channel_head: bool,
    /// Prefer candidates from their package's default channel
    pub prefer_default_channel: bool,
    /// Prefer candidates from catalogs that subscriptions name
    pub prefer_subscription_source: bool,
}

impl Policy {
    pub fn new() -> Self {
        Self {
            prefer_channel_head: true,
            prefer_default_channel: true,
            prefer_subscription_source: true,
        }
    }

    pub fn prefer_channel_head(mut self, prefer: bool) -> Self {
        self.prefer_channel_head = prefer;
        self
    }

    pub fn prefer_default_channel(mut self, prefer: bool) -> Self {
        self.prefer_default_channel = prefer;
        self
    }

    pub fn prefer_subscription_source(mut self, prefer: bool) -> Self {
        self.prefer_subscription_source = prefer;
        self
    }

    /// Soft cost of selecting a candidate that is not installed.
    ///
    /// `preferred` holds the catalogs subscriptions name; when empty no
    /// catalog is preferred over another.
    pub fn install_cost(
        &self,
        pool: &Pool,
        id: CandidateId,
        preferred: &BTreeSet<SourceKey>,
        weights: &Weights,
    ) -> u64 {
        let candidate = pool.candidate(id);
        let mut cost = weights.install;

        if self.prefer_subscription_source && !self.from_preferred(pool, id, preferred) {
            cost = cost.saturating_add(weights.subscription_source);
        }
        if self.prefer_default_channel && !candidate.entry.is_default_channel() {
            cost = cost.saturating_add(weights.default_channel);
        }
        if self.prefer_channel_head {
            cost = cost.saturating_add(u64::from(candidate.head_distance).min(weights.head_distance));
        }
        cost
    }

    fn from_preferred(&self, pool: &Pool, id: CandidateId, preferred: &BTreeSet<SourceKey>) -> bool {
        if preferred.is_empty() {
            return true;
        }
        pool.entry(id)
            .source_key()
            .map(|key| preferred.contains(key))
            .unwrap_or(false)
    }

    /// Order candidates best first.
    ///
    /// Installed candidates come first, then the tiers of
    /// [`install_cost`](Self::install_cost) in weight order. Candidates equal
    /// on every tier are ordered by package name, version (newest first) and
    /// identifier.
    pub fn select_preferred(&self, pool: &Pool, candidates: &[CandidateId], preferred: &BTreeSet<SourceKey>) -> Vec<CandidateId> {
        let mut sorted = candidates.to_vec();
        sorted.sort_by(|&a, &b| self.compare(pool, a, b, preferred));
        sorted
    }

    fn compare(&self, pool: &Pool, a: CandidateId, b: CandidateId, preferred: &BTreeSet<SourceKey>) -> Ordering {
        let ca = pool.candidate(a);
        let cb = pool.candidate(b);

        cb.installed
            .cmp(&ca.installed)
            .then_with(|| {
                if self.prefer_subscription_source {
                    self.from_preferred(pool, b, preferred)
                        .cmp(&self.from_preferred(pool, a, preferred))
                } else {
                    Ordering::Equal
                }
            })
            .then_with(|| {
                if self.prefer_default_channel {
                    cb.entry.is_default_channel().cmp(&ca.entry.is_default_channel())
                } else {
                    Ordering::Equal
                }
            })
            .then_with(|| ca.package().cmp(cb.package()))
            .then_with(|| {
                if self.prefer_channel_head {
                    ca.head_distance.cmp(&cb.head_distance)
                } else {
                    Ordering::Equal
                }
            })
            .then_with(|| compare_versions(ca.entry.version.as_ref(), cb.entry.version.as_ref()).reverse())
            .then_with(|| ca.entry.identifier().cmp(&cb.entry.identifier()))
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self::new()
    }
}

/// Compare optional versions; a missing version sorts below any version
fn compare_versions(a: Option<&Version>, b: Option<&Version>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}
