use std::collections::BTreeSet;

use log::debug;
use thiserror::Error;

use super::pool::Pool;
use super::rule_generator::{Encoding, RuleReason};
use crate::capability::CapabilityKey;
use crate::sat::{ClauseSolver, GroupId, SolveMode, SolveOutcome};

/// Why a resolution has no solution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("subscription {subscription} has no candidates in its channel and source")]
    NoCandidates { subscription: String },

    #[error("subscription {subscription} has no update path from installed {installed}")]
    NoUpdatePath { subscription: String, installed: String },

    #[error("installed {installed} cannot be replaced by {}, which is not on its update path", .candidates.join(", "))]
    NotOnUpdatePath { installed: String, candidates: Vec<String> },

    #[error("{capability} would be provided by more than one operator: {}", .owners.join(", "))]
    OwnershipConflict {
        capability: CapabilityKey,
        owners: Vec<String>,
        subscriptions: Vec<String>,
    },

    #[error("no operator provides {capability}, required by {}", .required_by.join(", "))]
    UnsatisfiedRequirement {
        capability: CapabilityKey,
        required_by: Vec<String>,
    },

    #[error("{dependent} depends on {dependency}, which cannot be satisfied")]
    UnsatisfiedDependency { dependency: String, dependent: String },

    #[error("subscriptions {} cannot share one operator of package {package}", .subscriptions.join(", "))]
    ConflictingSubscriptions { package: String, subscriptions: Vec<String> },

    #[error("constraints cannot be satisfied together: {}", .constraints.join("; "))]
    Unsatisfiable { constraints: Vec<String> },
}

/// Explain an unsatisfiable encoding.
///
/// Rule groups are dropped one at a time, in group order, whenever the rest
/// stays unsatisfiable. What remains is a minimal set of groups that cannot
/// hold together; the most specific error is built from it.
pub fn diagnose(encoding: &Encoding, pool: &Pool, solver: &dyn ClauseSolver) -> ResolutionError {
    // An empty subscription clause explains itself
    for reason in encoding.reasons() {
        if let Some(err) = subscription_error(reason, pool) {
            return err;
        }
    }

    let core = minimal_core(encoding, solver);
    debug!("unsatisfiable core has {} rule groups", core.len());
    explain(encoding, pool, &core)
}

fn subscription_error(reason: &RuleReason, pool: &Pool) -> Option<ResolutionError> {
    match reason {
        RuleReason::NoCandidates { subscription } => Some(ResolutionError::NoCandidates {
            subscription: subscription.name.clone(),
        }),
        RuleReason::NoUpdatePath { subscription, installed } => Some(ResolutionError::NoUpdatePath {
            subscription: subscription.name.clone(),
            installed: pool.entry(*installed).identifier(),
        }),
        _ => None,
    }
}

fn minimal_core(encoding: &Encoding, solver: &dyn ClauseSolver) -> BTreeSet<GroupId> {
    let mut core = encoding.rules.hard_groups();

    for group in encoding.rules.hard_groups() {
        core.remove(&group);
        let rest = encoding.rules.restrict_to(&core);
        if solver.solve(&rest, SolveMode::Satisfiable) != SolveOutcome::Unsatisfiable {
            core.insert(group);
        }
    }
    core
}

fn explain(encoding: &Encoding, pool: &Pool, core: &BTreeSet<GroupId>) -> ResolutionError {
    let reasons: Vec<&RuleReason> = core.iter().map(|&g| encoding.reason(g)).collect();

    let subscriptions_of = |packages: &BTreeSet<&str>| -> Vec<String> {
        reasons
            .iter()
            .filter_map(|r| match r {
                RuleReason::Subscription { subscription, .. } if packages.contains(subscription.package.as_str()) => {
                    Some(subscription.name.clone())
                }
                _ => None,
            })
            .collect()
    };

    for reason in &reasons {
        if let RuleReason::Ownership { capability, owners } = reason {
            let packages: BTreeSet<&str> = owners.iter().map(|&id| pool.candidate(id).package()).collect();
            return ResolutionError::OwnershipConflict {
                capability: capability.clone(),
                owners: owners.iter().map(|&id| pool.entry(id).identifier()).collect(),
                subscriptions: subscriptions_of(&packages),
            };
        }
    }

    for reason in &reasons {
        if let RuleReason::UpdatePath { installed, .. } = reason {
            let candidates = reasons
                .iter()
                .filter_map(|r| match r {
                    RuleReason::UpdatePath { installed: i, candidate } if i == installed => {
                        Some(pool.entry(*candidate).identifier())
                    }
                    _ => None,
                })
                .collect();
            return ResolutionError::NotOnUpdatePath {
                installed: pool.entry(*installed).identifier(),
                candidates,
            };
        }
    }

    for reason in &reasons {
        if let RuleReason::Requirement { capability, .. } = reason {
            let required_by = reasons
                .iter()
                .filter_map(|r| match r {
                    RuleReason::Requirement { capability: c, required_by } if c == capability => {
                        Some(pool.entry(*required_by).identifier())
                    }
                    _ => None,
                })
                .collect();
            return ResolutionError::UnsatisfiedRequirement {
                capability: capability.clone(),
                required_by,
            };
        }
    }

    for reason in &reasons {
        if let RuleReason::Dependency { dependency, required_by } = reason {
            return ResolutionError::UnsatisfiedDependency {
                dependency: dependency.to_string(),
                dependent: pool.entry(*required_by).identifier(),
            };
        }
    }

    for reason in &reasons {
        if let RuleReason::PackageUniqueness { package } = reason {
            let packages = BTreeSet::from([package.as_str()]);
            return ResolutionError::ConflictingSubscriptions {
                package: package.clone(),
                subscriptions: subscriptions_of(&packages),
            };
        }
    }

    ResolutionError::Unsatisfiable {
        constraints: reasons.iter().map(|r| r.describe(pool)).collect(),
    }
}
