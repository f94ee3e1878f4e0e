use crate::types::{Label, Reward, Rule};

/// A `#name` goal line: every rule declared before it is in that goal's
/// scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalMarker {
    pub name: String,
    /// Number of rules declared before the marker.
    pub end: usize,
    pub line: usize,
}

/// The result of parsing a rule table.
#[derive(Debug, Default, PartialEq)]
pub struct ParsedRules {
    pub rules: Vec<Rule>,
    pub goals: Vec<GoalMarker>,
}

/// The result of parsing a reward table.
#[derive(Debug, Default, PartialEq)]
pub struct ParsedRewards {
    pub labels: Vec<Label>,
    pub rewards: Vec<Reward>,
}
