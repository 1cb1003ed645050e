use std::collections::{BTreeSet, HashSet};
use std::fmt;

use log::warn;

use super::config::ResolverConfig;
use super::policy::{Policy, Weights};
use super::pool::{CandidateId, Pool};
use super::request::{Request, Subscription};
use crate::capability::CapabilityKey;
use crate::operator::{PackageDependency, SourceKey};
use crate::sat::{GroupId, Literal, RuleSet};

/// Why a group of rules exists; used to explain unsatisfiable problems.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleReason {
    /// The subscription must be served by one of its allowed candidates
    Subscription { subscription: Subscription, candidates: Vec<CandidateId> },
    /// The subscription's package, channel and source publish nothing
    NoCandidates { subscription: Subscription },
    /// Nothing in the subscription's channel updates the installed entry
    NoUpdatePath { subscription: Subscription, installed: CandidateId },
    /// At most one candidate of a package
    PackageUniqueness { package: String },
    /// `candidate` is not on the update path of the installed entry of its package
    UpdatePath { installed: CandidateId, candidate: CandidateId },
    /// A selected candidate needs a provider of `capability`
    Requirement { capability: CapabilityKey, required_by: CandidateId },
    /// A selected candidate needs some candidate of another package
    Dependency { dependency: PackageDependency, required_by: CandidateId },
    /// At most one provider of `capability`
    Ownership { capability: CapabilityKey, owners: Vec<CandidateId> },
    /// Soft preferences
    Preference,
}

impl RuleReason {
    /// Describe the reason using entry identifiers from `pool`
    pub fn describe(&self, pool: &Pool) -> String {
        match self {
            RuleReason::Subscription { subscription, .. } => format!("subscription {} requires one candidate", subscription),
            RuleReason::NoCandidates { subscription } => format!("subscription {} has no candidates", subscription),
            RuleReason::NoUpdatePath { subscription, installed } => format!(
                "subscription {} has no update path from {}",
                subscription,
                pool.entry(*installed)
            ),
            RuleReason::PackageUniqueness { package } => format!("at most one operator of package {}", package),
            RuleReason::UpdatePath { installed, candidate } => format!(
                "{} does not update installed {}",
                pool.entry(*candidate),
                pool.entry(*installed)
            ),
            RuleReason::Requirement { capability, required_by } => {
                format!("{} requires {}", pool.entry(*required_by), capability)
            }
            RuleReason::Dependency { dependency, required_by } => {
                format!("{} depends on {}", pool.entry(*required_by), dependency)
            }
            RuleReason::Ownership { capability, .. } => format!("at most one provider of {}", capability),
            RuleReason::Preference => "preferences".to_string(),
        }
    }
}

/// Rules over the pool's candidates together with the reason for each group.
#[derive(Debug)]
pub struct Encoding {
    pub rules: RuleSet,
    reasons: Vec<RuleReason>,
}

impl Encoding {
    pub fn reason(&self, group: GroupId) -> &RuleReason {
        &self.reasons[group as usize]
    }

    pub fn reasons(&self) -> &[RuleReason] {
        &self.reasons
    }
}

/// Generates SAT rules from the pool and a request.
///
/// Every candidate is one variable. Hard rules:
/// - Subscriptions: at least one allowed candidate is selected
/// - Uniqueness: at most one candidate of a package
/// - Update paths: an installed package only moves along its replaces chain
/// - Requirements: a selected candidate's required capabilities are provided
/// - Dependencies: a selected candidate's package dependencies are met
/// - Ownership: at most one selected provider of each capability
///
/// Soft rules keep installed operators and weigh new ones by [`Policy`].
pub struct RuleGenerator<'a> {
    pool: &'a Pool,
    config: &'a ResolverConfig,
    rules: RuleSet,
    reasons: Vec<RuleReason>,
    preferred_sources: BTreeSet<SourceKey>,
}

impl<'a> RuleGenerator<'a> {
    pub fn new(pool: &'a Pool, config: &'a ResolverConfig) -> Self {
        let mut rules = RuleSet::new();
        for id in pool.ids() {
            rules.new_variable(pool.entry(id).identifier());
        }

        Self {
            pool,
            config,
            rules,
            reasons: Vec::new(),
            preferred_sources: BTreeSet::new(),
        }
    }

    fn policy(&self) -> &Policy {
        &self.config.policy
    }

    /// Generate all rules for a request
    pub fn generate(mut self, request: &Request) -> Encoding {
        self.preferred_sources = request.subscribed_sources();

        // Subscriptions first: the solver branches in rule order
        self.add_subscription_rules(request);
        self.add_uniqueness_rules();
        self.add_update_path_rules();
        self.add_requirement_rules();
        self.add_ownership_rules();
        self.add_preference_rules();

        Encoding {
            rules: self.rules,
            reasons: self.reasons,
        }
    }

    fn group(&mut self, reason: RuleReason) -> GroupId {
        self.reasons.push(reason);
        (self.reasons.len() - 1) as GroupId
    }

    fn literals(ids: &[CandidateId]) -> Vec<Literal> {
        ids.iter().map(|&id| Pool::literal(id)).collect()
    }

    /// Candidates `subscription` may be served by, best first
    pub fn allowed_candidates(&self, subscription: &Subscription) -> Result<Vec<CandidateId>, RuleReason> {
        let pool = self.pool;
        let matching: Vec<CandidateId> = pool
            .candidates_for_package(&subscription.package)
            .iter()
            .copied()
            .filter(|&id| subscription.allows(pool.entry(id)))
            .collect();

        let allowed: Vec<CandidateId> = match pool.installed_for_package(&subscription.package) {
            Some(installed) => {
                let allowed = updates_of(pool, installed, &matching);
                if allowed.is_empty() {
                    return Err(RuleReason::NoUpdatePath {
                        subscription: subscription.clone(),
                        installed,
                    });
                }
                allowed
            }
            None => match &subscription.starting_csv {
                Some(csv) => matching.into_iter().filter(|&id| &pool.entry(id).name == csv).collect(),
                None => matching,
            },
        };

        if allowed.is_empty() {
            return Err(RuleReason::NoCandidates {
                subscription: subscription.clone(),
            });
        }
        Ok(self.policy().select_preferred(pool, &allowed, &self.preferred_sources))
    }

    fn add_subscription_rules(&mut self, request: &Request) {
        for subscription in request.sorted_subscriptions() {
            match self.allowed_candidates(subscription) {
                Ok(candidates) => {
                    let literals = Self::literals(&candidates);
                    let group = self.group(RuleReason::Subscription {
                        subscription: subscription.clone(),
                        candidates,
                    });
                    self.rules.add_hard(literals, group);
                }
                Err(reason) => {
                    let group = self.group(reason);
                    self.rules.add_hard(Vec::new(), group);
                }
            }
        }
    }

    fn add_uniqueness_rules(&mut self) {
        let pool = self.pool;
        for (package, ids) in pool.packages() {
            if ids.len() < 2 {
                continue;
            }
            let group = self.group(RuleReason::PackageUniqueness {
                package: package.to_string(),
            });
            for (i, &a) in ids.iter().enumerate() {
                for &b in &ids[i + 1..] {
                    self.rules.add_hard(vec![-Pool::literal(a), -Pool::literal(b)], group);
                }
            }
        }
    }

    /// Rule out every candidate of an installed package that the installed
    /// entry cannot update to. Dropping the package stays possible.
    fn add_update_path_rules(&mut self) {
        let pool = self.pool;
        for (_, ids) in pool.packages() {
            let installed: Vec<CandidateId> = ids.iter().copied().filter(|&id| pool.candidate(id).installed).collect();
            let Some(&first) = installed.first() else {
                continue;
            };

            let allowed: BTreeSet<CandidateId> = installed
                .iter()
                .flat_map(|&id| updates_of(pool, id, ids))
                .collect();

            for &candidate in ids {
                if allowed.contains(&candidate) {
                    continue;
                }
                let group = self.group(RuleReason::UpdatePath {
                    installed: first,
                    candidate,
                });
                self.rules.add_hard(vec![-Pool::literal(candidate)], group);
            }
        }
    }

    /// Capability requirements and package dependencies of every candidate
    fn add_requirement_rules(&mut self) {
        let pool = self.pool;
        let all: Vec<CandidateId> = pool.ids().collect();
        let ordered = self.policy().select_preferred(pool, &all, &self.preferred_sources);
        let rank: Vec<usize> = {
            let mut rank = vec![0; pool.len()];
            for (position, &id) in ordered.iter().enumerate() {
                rank[id] = position;
            }
            rank
        };

        for &id in &ordered {
            let entry = pool.entry(id);

            for capability in entry.required_apis.iter() {
                let capability = capability.without_plural();
                if self.config.externally_satisfied(&capability) {
                    warn!("{} requires {}, treated as served by the cluster", entry, capability);
                    continue;
                }

                let mut providers = pool.providers(&capability).to_vec();
                providers.sort_by_key(|&p| rank[p]);

                let mut literals = vec![-Pool::literal(id)];
                literals.extend(Self::literals(&providers));
                let group = self.group(RuleReason::Requirement {
                    capability,
                    required_by: id,
                });
                self.rules.add_hard(literals, group);
            }

            for dependency in &entry.dependencies {
                let mut matching = pool.matching(dependency);
                matching.sort_by_key(|&p| rank[p]);

                let mut literals = vec![-Pool::literal(id)];
                literals.extend(Self::literals(&matching));
                let group = self.group(RuleReason::Dependency {
                    dependency: dependency.clone(),
                    required_by: id,
                });
                self.rules.add_hard(literals, group);
            }
        }
    }

    /// One at-most-one group per capability, driven by the owner index.
    ///
    /// Candidates of the same package are already exclusive, so only pairs
    /// from different packages get a rule.
    fn add_ownership_rules(&mut self) {
        let pool = self.pool;
        let mut index = pool.owner_index();

        while let Some((capability, owners)) = index.pop_entry() {
            let ids: Vec<CandidateId> = owners.keys().filter_map(|key| pool.id_of(key)).collect();

            let mut pairs = Vec::new();
            for (i, &a) in ids.iter().enumerate() {
                for &b in &ids[i + 1..] {
                    if pool.candidate(a).package() != pool.candidate(b).package() {
                        pairs.push((a, b));
                    }
                }
            }
            if pairs.is_empty() {
                continue;
            }

            let group = self.group(RuleReason::Ownership { capability, owners: ids });
            for (a, b) in pairs {
                self.rules.add_hard(vec![-Pool::literal(a), -Pool::literal(b)], group);
            }
        }
    }

    fn add_preference_rules(&mut self) {
        let pool = self.pool;
        let group = self.group(RuleReason::Preference);
        let weights = Weights::new(self.policy(), pool);

        for id in pool.ids() {
            if pool.candidate(id).installed {
                self.rules.add_soft(vec![Pool::literal(id)], weights.keep_installed, group);
            } else {
                let cost = self.policy().install_cost(pool, id, &self.preferred_sources, &weights);
                self.rules.add_soft(vec![-Pool::literal(id)], cost, group);
            }
        }
    }
}

/// The installed candidate and its republications under the same name (if
/// among `matching`) plus every candidate of `matching` whose replaces or
/// skips chain leads back to it
fn updates_of(pool: &Pool, installed: CandidateId, matching: &[CandidateId]) -> Vec<CandidateId> {
    let name = &pool.entry(installed).name;
    let mut reached: HashSet<String> = HashSet::from([name.clone()]);
    let mut allowed: Vec<CandidateId> = matching
        .iter()
        .copied()
        .filter(|&id| id == installed || &pool.entry(id).name == name)
        .collect();

    loop {
        let mut changed = false;
        for &id in matching {
            if allowed.contains(&id) {
                continue;
            }
            let entry = pool.entry(id);
            if entry.replaces.iter().chain(entry.skips.iter()).any(|name| reached.contains(name)) {
                reached.insert(entry.name.clone());
                allowed.push(id);
                changed = true;
            }
        }
        if !changed {
            return allowed;
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rule in self.rules.rules() {
            writeln!(f, "{} [{:?}]", rule, self.reasons[rule.group() as usize])?;
        }
        Ok(())
    }
}
