use std::time::{Duration, Instant};

use log::trace;

use super::decisions::Decisions;
use super::rule::{Literal, Rule, VariableId};
use super::rule_set::RuleSet;

/// How much of the problem the solver has to answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveMode {
    /// Any assignment satisfying the hard rules
    Satisfiable,
    /// The assignment of least soft cost
    Optimize,
}

/// A complete assignment of every variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// Indexed by variable id; slot 0 is unused
    values: Vec<bool>,
    cost: u64,
}

impl Assignment {
    pub fn is_true(&self, var: VariableId) -> bool {
        self.values.get(var as usize).copied().unwrap_or(false)
    }

    /// Variables set true, in id order
    pub fn true_variables(&self) -> impl Iterator<Item = VariableId> + '_ {
        self.values
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, v)| **v)
            .map(|(id, _)| id as VariableId)
    }

    /// Total weight of the soft rules this assignment violates
    pub fn cost(&self) -> u64 {
        self.cost
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveOutcome {
    Solved(Assignment),
    Unsatisfiable,
    TimedOut,
}

/// Strategy that decides a weighted clause problem.
pub trait ClauseSolver: Send + Sync {
    fn solve(&self, rules: &RuleSet, mode: SolveMode) -> SolveOutcome;
}

/// Depth-first search with unit propagation and branch-and-bound.
///
/// Branching takes literals in rule order, trying each literal true before
/// false, so the first solution found follows the order the rules list their
/// candidates in. Later solutions replace it only when strictly cheaper.
#[derive(Debug, Clone, Default)]
pub struct DpllSolver {
    timeout: Option<Duration>,
}

impl DpllSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl ClauseSolver for DpllSolver {
    fn solve(&self, rules: &RuleSet, mode: SolveMode) -> SolveOutcome {
        let mut search = Search {
            hard: rules.hard_rules().collect(),
            soft: rules.soft_rules().collect(),
            decisions: Decisions::new(rules.variable_count()),
            variable_count: rules.variable_count(),
            mode,
            deadline: self.timeout.map(|t| Instant::now() + t),
            best: None,
            timed_out: false,
            nodes: 0,
        };

        search.run();
        trace!("search visited {} nodes", search.nodes);

        if search.timed_out {
            return SolveOutcome::TimedOut;
        }
        match search.best {
            Some(assignment) => SolveOutcome::Solved(assignment),
            None => SolveOutcome::Unsatisfiable,
        }
    }
}

struct Search<'a> {
    hard: Vec<&'a Rule>,
    soft: Vec<&'a Rule>,
    decisions: Decisions,
    variable_count: usize,
    mode: SolveMode,
    deadline: Option<Instant>,
    best: Option<Assignment>,
    timed_out: bool,
    nodes: u64,
}

impl Search<'_> {
    /// Returns true once the search should stop
    fn run(&mut self) -> bool {
        self.nodes += 1;
        if self.out_of_time() {
            return true;
        }

        let level = self.decisions.level();
        if !self.propagate() {
            return false;
        }

        if self.mode == SolveMode::Optimize {
            if let Some(best) = &self.best {
                if self.violated_cost() >= best.cost {
                    return false;
                }
            }
        }

        let Some(literal) = self.pick_branch() else {
            return self.record_leaf();
        };

        for choice in [literal, -literal] {
            self.decisions.increment_level();
            self.decisions.decide(choice);
            if self.run() {
                return true;
            }
            self.decisions.revert_to_level(level);
        }
        false
    }

    fn out_of_time(&mut self) -> bool {
        if let Some(deadline) = self.deadline {
            if self.nodes % 64 == 1 && Instant::now() >= deadline {
                self.timed_out = true;
            }
        }
        self.timed_out
    }

    /// Unit propagation over the hard rules.
    ///
    /// Returns false when some rule has every literal falsified.
    fn propagate(&mut self) -> bool {
        loop {
            let mut changed = false;
            for rule in &self.hard {
                let mut open = None;
                let mut open_count = 0;
                let mut satisfied = false;

                for &lit in rule.literals() {
                    if self.decisions.satisfied(lit) {
                        satisfied = true;
                        break;
                    }
                    if self.decisions.undecided(lit) {
                        open_count += 1;
                        open = Some(lit);
                    }
                }

                if satisfied {
                    continue;
                }
                match (open_count, open) {
                    (0, _) => return false,
                    (1, Some(lit)) => {
                        self.decisions.decide(lit);
                        changed = true;
                    }
                    _ => {}
                }
            }
            if !changed {
                return true;
            }
        }
    }

    /// Next literal to branch on, or `None` when completing every open
    /// variable as false is as good as any other completion.
    ///
    /// A rule with an open negative literal is left alone since the false
    /// completion already satisfies it.
    fn pick_branch(&self) -> Option<Literal> {
        let soft: &[&Rule] = match self.mode {
            SolveMode::Satisfiable => &[],
            SolveMode::Optimize => &self.soft,
        };

        for rule in self.hard.iter().chain(soft.iter()) {
            let lits = rule.literals();
            if lits.iter().any(|&l| self.decisions.satisfied(l)) {
                continue;
            }
            if lits.iter().any(|&l| l < 0 && self.decisions.undecided(l)) {
                continue;
            }
            if let Some(&lit) = lits.iter().find(|&&l| self.decisions.undecided(l)) {
                return Some(lit);
            }
        }
        None
    }

    /// Weight of soft rules every literal of which is already falsified
    fn violated_cost(&self) -> u64 {
        self.soft
            .iter()
            .filter(|r| r.literals().iter().all(|&l| self.decisions.conflict(l)))
            .fold(0u64, |acc, r| acc.saturating_add(r.weight()))
    }

    /// Complete the assignment with false and keep it if it is the best so far
    fn record_leaf(&mut self) -> bool {
        let values: Vec<bool> = (0..=self.variable_count)
            .map(|var| var > 0 && self.decisions.value(var as VariableId) == Some(true))
            .collect();

        let cost = self
            .soft
            .iter()
            .filter(|r| !r.holds(|v| values[v as usize]))
            .fold(0u64, |acc, r| acc.saturating_add(r.weight()));

        let better = self.best.as_ref().map(|b| cost < b.cost).unwrap_or(true);
        if better {
            trace!("solution with cost {}", cost);
            self.best = Some(Assignment { values, cost });
        }

        self.mode == SolveMode::Satisfiable || cost == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solve(rules: &RuleSet, mode: SolveMode) -> SolveOutcome {
        DpllSolver::new().solve(rules, mode)
    }

    fn solved(outcome: SolveOutcome) -> Assignment {
        match outcome {
            SolveOutcome::Solved(assignment) => assignment,
            other => panic!("expected a solution, got {:?}", other),
        }
    }

    fn vars(rules: &mut RuleSet, names: &[&str]) -> Vec<Literal> {
        names.iter().map(|n| rules.new_variable(*n) as Literal).collect()
    }

    #[test]
    fn test_empty_problem() {
        let rules = RuleSet::new();
        let assignment = solved(solve(&rules, SolveMode::Optimize));
        assert_eq!(assignment.true_variables().count(), 0);
        assert_eq!(assignment.cost(), 0);
    }

    #[test]
    fn test_unit_propagation() {
        let mut rules = RuleSet::new();
        let v = vars(&mut rules, &["a", "b", "c"]);
        rules.add_hard(vec![v[0]], 0);
        rules.add_hard(vec![-v[0], v[1]], 1);
        rules.add_hard(vec![-v[1], -v[2]], 2);

        let assignment = solved(solve(&rules, SolveMode::Satisfiable));
        assert!(assignment.is_true(1));
        assert!(assignment.is_true(2));
        assert!(!assignment.is_true(3));
    }

    #[test]
    fn test_unsatisfiable() {
        let mut rules = RuleSet::new();
        let v = vars(&mut rules, &["a", "b"]);
        rules.add_hard(vec![v[0], v[1]], 0);
        rules.add_hard(vec![-v[0]], 1);
        rules.add_hard(vec![-v[1]], 2);

        assert_eq!(solve(&rules, SolveMode::Satisfiable), SolveOutcome::Unsatisfiable);
        assert_eq!(solve(&rules, SolveMode::Optimize), SolveOutcome::Unsatisfiable);
    }

    #[test]
    fn test_empty_rule_is_unsatisfiable() {
        let mut rules = RuleSet::new();
        rules.new_variable("a");
        rules.add_hard(vec![], 0);
        assert_eq!(solve(&rules, SolveMode::Satisfiable), SolveOutcome::Unsatisfiable);
    }

    #[test]
    fn test_first_literal_preferred_on_ties() {
        let mut rules = RuleSet::new();
        let v = vars(&mut rules, &["a", "b"]);
        rules.add_hard(vec![v[1], v[0]], 0);
        rules.add_hard(vec![-v[0], -v[1]], 1);

        let assignment = solved(solve(&rules, SolveMode::Optimize));
        assert_eq!(assignment.true_variables().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_optimize_minimizes_cost() {
        let mut rules = RuleSet::new();
        let v = vars(&mut rules, &["a", "b"]);
        rules.add_hard(vec![v[0], v[1]], 0);
        rules.add_hard(vec![-v[0], -v[1]], 1);
        rules.add_soft(vec![-v[0]], 10, 2);
        rules.add_soft(vec![-v[1]], 3, 3);

        let assignment = solved(solve(&rules, SolveMode::Optimize));
        assert_eq!(assignment.true_variables().collect::<Vec<_>>(), vec![2]);
        assert_eq!(assignment.cost(), 3);

        let first = solved(solve(&rules, SolveMode::Satisfiable));
        assert_eq!(first.true_variables().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_positive_soft_rule_is_branched() {
        let mut rules = RuleSet::new();
        let v = vars(&mut rules, &["keep", "other"]);
        rules.add_hard(vec![-v[0], -v[1]], 0);
        rules.add_soft(vec![v[0]], 100, 1);
        rules.add_soft(vec![-v[1]], 1, 2);

        let assignment = solved(solve(&rules, SolveMode::Optimize));
        assert!(assignment.is_true(1));
        assert!(!assignment.is_true(2));
        assert_eq!(assignment.cost(), 0);
    }

    #[test]
    fn test_soft_rules_never_override_hard_rules() {
        let mut rules = RuleSet::new();
        let v = vars(&mut rules, &["a"]);
        rules.add_hard(vec![v[0]], 0);
        rules.add_soft(vec![-v[0]], 1_000, 1);

        let assignment = solved(solve(&rules, SolveMode::Optimize));
        assert!(assignment.is_true(1));
        assert_eq!(assignment.cost(), 1_000);
    }

    #[test]
    fn test_pigeonhole_needs_backtracking() {
        // three pigeons, two holes
        let mut rules = RuleSet::new();
        let mut p = Vec::new();
        for i in 0..3 {
            p.push(vars(&mut rules, &[&format!("p{}h0", i), &format!("p{}h1", i)]));
        }
        for (i, holes) in p.iter().enumerate() {
            rules.add_hard(holes.clone(), i as u32);
        }
        for h in 0..2 {
            for i in 0..3 {
                for j in (i + 1)..3 {
                    rules.add_hard(vec![-p[i][h], -p[j][h]], 10);
                }
            }
        }

        assert_eq!(solve(&rules, SolveMode::Optimize), SolveOutcome::Unsatisfiable);
    }

    #[test]
    fn test_zero_timeout_times_out() {
        let mut rules = RuleSet::new();
        let names: Vec<String> = (0..12).map(|i| format!("v{}", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let v = vars(&mut rules, &refs);
        for pair in v.chunks(2) {
            rules.add_hard(pair.to_vec(), 0);
        }
        for &lit in &v {
            rules.add_soft(vec![lit], 1, 1);
            rules.add_soft(vec![-lit], 1, 2);
        }

        let outcome = DpllSolver::new()
            .with_timeout(Some(Duration::ZERO))
            .solve(&rules, SolveMode::Optimize);
        assert_eq!(outcome, SolveOutcome::TimedOut);
    }
}
