//! Weighted clause solving.
//!
//! The resolver encodes its problem as hard and soft rules over named
//! boolean variables and hands it to a [`ClauseSolver`]. [`DpllSolver`] is
//! the built-in strategy: unit propagation with chronological backtracking,
//! extended with branch-and-bound over the soft rules.

mod decisions;
mod rule;
mod rule_set;
mod solver;

pub use rule::{GroupId, Literal, Rule, VariableId};
pub use rule_set::{RuleSet, RuleSetStats};
pub use solver::{Assignment, ClauseSolver, DpllSolver, SolveMode, SolveOutcome};
