use super::rule::{Literal, VariableId};

/// A single decision record
#[derive(Debug, Clone, Copy)]
struct Decision {
    /// Whether the variable was set true
    value: bool,
    /// The decision level at which this was decided
    level: u32,
}

/// Tracks the partial assignment built during search.
///
/// Each decision records its value and the level it was made at, so the
/// search can undo everything above a level when it backtracks.
#[derive(Debug)]
pub struct Decisions {
    /// Indexed by variable id; slot 0 is unused
    decision_map: Vec<Option<Decision>>,

    /// Literals in the order they were decided
    decision_queue: Vec<Literal>,

    level: u32,
}

impl Decisions {
    pub fn new(variable_count: usize) -> Self {
        Self {
            decision_map: vec![None; variable_count + 1],
            decision_queue: Vec::new(),
            level: 0,
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn increment_level(&mut self) {
        self.level += 1;
    }

    /// Make a decision at the current level
    ///
    /// Returns false if this conflicts with an existing decision
    pub fn decide(&mut self, literal: Literal) -> bool {
        let var = literal.unsigned_abs() as usize;
        let value = literal > 0;

        match self.decision_map[var] {
            Some(existing) => existing.value == value,
            None => {
                self.decision_map[var] = Some(Decision {
                    value,
                    level: self.level,
                });
                self.decision_queue.push(literal);
                true
            }
        }
    }

    /// Check if a literal is satisfied by current decisions
    pub fn satisfied(&self, literal: Literal) -> bool {
        self.value(literal.unsigned_abs()) == Some(literal > 0)
    }

    /// Check if a literal conflicts with current decisions
    pub fn conflict(&self, literal: Literal) -> bool {
        self.value(literal.unsigned_abs()) == Some(literal < 0)
    }

    pub fn undecided(&self, literal: Literal) -> bool {
        self.value(literal.unsigned_abs()).is_none()
    }

    pub fn value(&self, var: VariableId) -> Option<bool> {
        self.decision_map
            .get(var as usize)
            .copied()
            .flatten()
            .map(|d| d.value)
    }

    pub fn decision_level(&self, literal: Literal) -> Option<u32> {
        self.decision_map
            .get(literal.unsigned_abs() as usize)
            .copied()
            .flatten()
            .map(|d| d.level)
    }

    /// Revert all decisions at levels > target_level
    pub fn revert_to_level(&mut self, target_level: u32) {
        while let Some(&literal) = self.decision_queue.last() {
            let var = literal.unsigned_abs() as usize;
            match self.decision_map[var] {
                Some(decision) if decision.level > target_level => {
                    self.decision_map[var] = None;
                    self.decision_queue.pop();
                }
                _ => break,
            }
        }
        self.level = target_level;
    }

    pub fn queue(&self) -> &[Literal] {
        &self.decision_queue
    }

    pub fn len(&self) -> usize {
        self.decision_queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decision_queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decisions_new() {
        let decisions = Decisions::new(3);
        assert_eq!(decisions.level(), 0);
        assert!(decisions.is_empty());
        assert!(decisions.undecided(1));
        assert_eq!(decisions.value(4), None);
    }

    #[test]
    fn test_decisions_decide() {
        let mut decisions = Decisions::new(2);

        assert!(decisions.decide(1));
        assert!(decisions.satisfied(1));
        assert!(!decisions.satisfied(-1));
        assert_eq!(decisions.value(1), Some(true));

        assert!(decisions.decide(-2));
        assert!(decisions.satisfied(-2));
        assert!(decisions.conflict(2));
        assert_eq!(decisions.queue(), &[1, -2]);
    }

    #[test]
    fn test_decisions_conflict() {
        let mut decisions = Decisions::new(1);
        decisions.decide(1);

        assert!(!decisions.decide(-1));
        assert!(decisions.conflict(-1));
        assert!(decisions.decide(1));
        assert_eq!(decisions.len(), 1);
    }

    #[test]
    fn test_revert_to_level() {
        let mut decisions = Decisions::new(3);
        decisions.decide(1);

        decisions.increment_level();
        decisions.decide(2);
        decisions.increment_level();
        decisions.decide(-3);
        assert_eq!(decisions.decision_level(-3), Some(2));

        decisions.revert_to_level(1);
        assert_eq!(decisions.level(), 1);
        assert!(decisions.undecided(3));
        assert!(decisions.satisfied(2));

        decisions.revert_to_level(0);
        assert_eq!(decisions.queue(), &[1]);
        assert_eq!(decisions.decision_level(1), Some(0));
    }
}
