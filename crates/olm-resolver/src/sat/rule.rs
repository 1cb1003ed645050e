use std::fmt;

/// A signed variable id: positive selects the variable, negative rejects it.
pub type Literal = i32;

/// Variable ids start at 1 so every id has a distinct negation.
pub type VariableId = u32;

/// Identifies the constraint a rule was generated for
pub type GroupId = u32;

/// A single clause: at least one of its literals must hold.
///
/// Hard rules must be satisfied by every solution. Soft rules carry a weight
/// that is paid when the solution violates them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    literals: Vec<Literal>,
    weight: Option<u64>,
    group: GroupId,
}

impl Rule {
    pub fn hard(literals: Vec<Literal>, group: GroupId) -> Self {
        Self {
            literals,
            weight: None,
            group,
        }
    }

    pub fn soft(literals: Vec<Literal>, weight: u64, group: GroupId) -> Self {
        Self {
            literals,
            weight: Some(weight),
            group,
        }
    }

    pub fn literals(&self) -> &[Literal] {
        &self.literals
    }

    pub fn is_hard(&self) -> bool {
        self.weight.is_none()
    }

    /// Cost of violating the rule; zero for hard rules
    pub fn weight(&self) -> u64 {
        self.weight.unwrap_or(0)
    }

    pub fn group(&self) -> GroupId {
        self.group
    }

    /// An empty clause can never be satisfied
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    /// Whether the rule holds when `value` gives the truth of each variable
    pub fn holds(&self, value: impl Fn(VariableId) -> bool) -> bool {
        self.literals.iter().any(|&lit| value(lit.unsigned_abs()) == (lit > 0))
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lits: Vec<String> = self.literals.iter().map(|l| l.to_string()).collect();
        match self.weight {
            Some(w) => write!(f, "({}) w={}", lits.join(" | "), w),
            None => write!(f, "({})", lits.join(" | ")),
        }
    }
}
