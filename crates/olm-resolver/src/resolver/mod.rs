//! Operator resolution.
//!
//! Resolution builds a [`Pool`] from a catalog snapshot and the installed
//! operators, encodes subscriptions, capability requirements, package
//! dependencies and capability ownership as rules over the pool's
//! candidates, and hands them to a [`ClauseSolver`]. Soft rules prefer
//! keeping what is installed.
//!
//! Every call builds its own pool and rules, so calls share no state and
//! may run in parallel.

mod config;
mod policy;
mod pool;
mod problem;
mod request;
mod rule_generator;


use std::sync::Arc;

use log::{debug, info, trace};
use tokio_util::sync::CancellationToken;

pub use config::{ExternalCapabilityPolicy, ResolverConfig};
pub use policy::{Policy, Weights};
pub use pool::{Candidate, CandidateId, Pool};
pub use problem::ResolutionError;
pub use request::{Request, Subscription};
pub use rule_generator::{Encoding, RuleGenerator, RuleReason};

use crate::catalog::{self, CatalogSnapshot, SourceProvider};
use crate::operator::OperatorSet;
use crate::sat::{ClauseSolver, DpllSolver, SolveMode, SolveOutcome};
use crate::{Error, Result};

/// Resolves subscriptions against the catalogs a [`SourceProvider`] exposes.
pub struct SatResolver {
    provider: Arc<dyn SourceProvider>,
    config: ResolverConfig,
    solver: Box<dyn ClauseSolver>,
}

impl SatResolver {
    pub fn new(provider: Arc<dyn SourceProvider>, config: ResolverConfig) -> Self {
        let solver = DpllSolver::new().with_timeout(config.timeout());
        Self {
            provider,
            config,
            solver: Box::new(solver),
        }
    }

    /// Replace the clause solver
    pub fn with_solver(mut self, solver: impl ClauseSolver + 'static) -> Self {
        self.solver = Box::new(solver);
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Fetch the catalogs visible to `namespaces` and resolve against them.
    ///
    /// Cancelling `cancel` while catalogs are being fetched aborts with
    /// [`Error::Cancelled`] before any rule is built.
    pub async fn solve_operators(
        &self,
        namespaces: &[String],
        installed: &OperatorSet,
        subscriptions: &[Subscription],
        cancel: &CancellationToken,
    ) -> Result<OperatorSet> {
        let snapshot = catalog::fetch(self.provider.as_ref(), namespaces, cancel).await?;
        self.solve_snapshot(&snapshot, installed, subscriptions)
    }

    /// Resolve against an already fetched snapshot
    pub fn solve_snapshot(
        &self,
        snapshot: &CatalogSnapshot,
        installed: &OperatorSet,
        subscriptions: &[Subscription],
    ) -> Result<OperatorSet> {
        let pool = Pool::new(snapshot, installed);
        let request = Request::new(installed.clone(), subscriptions.to_vec());
        let encoding = RuleGenerator::new(&pool, &self.config).generate(&request);

        debug!(
            "resolving {} subscriptions over {} candidates: {}",
            subscriptions.len(),
            pool.len(),
            encoding.rules.stats()
        );
        trace!("rules:\n{}", encoding);

        match self.solver.solve(&encoding.rules, SolveMode::Optimize) {
            SolveOutcome::Solved(assignment) => {
                // bundle names may repeat across packages and channels
                let mut selected = OperatorSet::new();
                for var in assignment.true_variables() {
                    let entry = pool.entry(Pool::candidate_of(var));
                    selected.insert(entry.identifier(), Arc::clone(entry));
                }
                info!(
                    "resolved {} operators ({} newly selected)",
                    selected.len(),
                    assignment
                        .true_variables()
                        .filter(|&var| !pool.candidate(Pool::candidate_of(var)).installed)
                        .count()
                );
                Ok(selected)
            }
            SolveOutcome::TimedOut => Err(Error::Timeout(self.config.timeout().unwrap_or_default())),
            SolveOutcome::Unsatisfiable => {
                let err = problem::diagnose(&encoding, &pool, self.solver.as_ref());
                info!("resolution failed: {}", err);
                Err(Error::Unsatisfiable(err))
            }
        }
    }
}
