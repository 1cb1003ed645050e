use std::collections::BTreeSet;
use std::fmt;

use super::rule::{GroupId, Literal, Rule, VariableId};

/// Counts describing the size of a problem
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuleSetStats {
    pub variables: usize,
    pub hard: usize,
    pub soft: usize,
}

impl fmt::Display for RuleSetStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} variables, {} hard rules, {} soft rules",
            self.variables, self.hard, self.soft
        )
    }
}

/// Named boolean variables plus the hard and soft rules over them.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    /// Variable names, indexed by `id - 1`
    names: Vec<String>,
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh variable
    pub fn new_variable(&mut self, name: impl Into<String>) -> VariableId {
        self.names.push(name.into());
        self.names.len() as VariableId
    }

    pub fn variable_count(&self) -> usize {
        self.names.len()
    }

    pub fn variable_name(&self, id: VariableId) -> Option<&str> {
        let index = (id as usize).checked_sub(1)?;
        self.names.get(index).map(String::as_str)
    }

    pub fn add_hard(&mut self, literals: Vec<Literal>, group: GroupId) {
        self.rules.push(Rule::hard(literals, group));
    }

    pub fn add_soft(&mut self, literals: Vec<Literal>, weight: u64, group: GroupId) {
        self.rules.push(Rule::soft(literals, weight, group));
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn hard_rules(&self) -> impl Iterator<Item = &Rule> + '_ {
        self.rules.iter().filter(|r| r.is_hard())
    }

    pub fn soft_rules(&self) -> impl Iterator<Item = &Rule> + '_ {
        self.rules.iter().filter(|r| !r.is_hard())
    }

    /// Every group that owns at least one hard rule, in ascending order
    pub fn hard_groups(&self) -> BTreeSet<GroupId> {
        self.hard_rules().map(Rule::group).collect()
    }

    /// Copy of this set keeping only the hard rules of `groups`.
    ///
    /// Variables are kept so ids stay valid.
    pub fn restrict_to(&self, groups: &BTreeSet<GroupId>) -> RuleSet {
        RuleSet {
            names: self.names.clone(),
            rules: self
                .hard_rules()
                .filter(|r| groups.contains(&r.group()))
                .cloned()
                .collect(),
        }
    }

    pub fn stats(&self) -> RuleSetStats {
        let hard = self.hard_rules().count();
        RuleSetStats {
            variables: self.names.len(),
            hard,
            soft: self.rules.len() - hard,
        }
    }
}
