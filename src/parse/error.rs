use thiserror::Error;

/// Errors produced while parsing a rule or reward table.
///
/// Lines and columns are 1-based. `table` names the source (`rules` or
/// `rewards`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("in `{table}`, found {found} at {line}:{column}; expected {expected}")]
    Unexpected {
        table: &'static str,
        line: usize,
        column: usize,
        found: String,
        expected: &'static str,
    },

    #[error("in `{table}`, set flag `{flag}` at {line}:{column} that was already set")]
    DuplicateFlag {
        table: &'static str,
        flag: String,
        line: usize,
        column: usize,
    },

    #[error("in `{table}`, found `;` at {line}:{column} after unclosed `(`")]
    UnclosedGroup {
        table: &'static str,
        line: usize,
        column: usize,
    },

    #[error("in `{table}`, found `)` at {line}:{column} without matching `(`")]
    UnmatchedParen {
        table: &'static str,
        line: usize,
        column: usize,
    },

    #[error(
        "in `{table}`, found `{found}` at {line}:{column} in group containing `{existing}`; use parentheses"
    )]
    OperatorConflict {
        table: &'static str,
        line: usize,
        column: usize,
        found: char,
        existing: char,
    },

    #[error("in `{table}`, quantity `{value}` at {line}:{column} must be a natural number")]
    NonNaturalQuantity {
        table: &'static str,
        line: usize,
        column: usize,
        value: u64,
    },

    #[error("in `{table}`, quantity at {line}:{column} must follow an item reference")]
    QuantityTarget {
        table: &'static str,
        line: usize,
        column: usize,
    },

    #[error("in `{table}`, rule `{name}` on line {line} shadows a previous rule")]
    DuplicateRule {
        table: &'static str,
        name: String,
        line: usize,
    },

    #[error("in `{table}`, goal `{name}` on line {line} shadows a previous goal")]
    DuplicateGoal {
        table: &'static str,
        name: String,
        line: usize,
    },

    #[error("in `{table}`, rule `{rule}` on line {line} has unrecognized flag `{flag}`")]
    UnrecognizedFlag {
        table: &'static str,
        rule: String,
        flag: String,
        line: usize,
    },

    #[error("in `{table}`, reward `{name}` on line {line} shadows a previous reward")]
    DuplicateReward {
        table: &'static str,
        name: String,
        line: usize,
    },

    #[error("in `{table}`, started label `{name}` at {line}:{column} that was already used")]
    DuplicateLabel {
        table: &'static str,
        name: String,
        line: usize,
        column: usize,
    },

    #[error("in `{table}`, reward `{name}` on line {line} is not labeled")]
    UnlabeledReward {
        table: &'static str,
        name: String,
        line: usize,
    },
}

impl ParseError {
    /// The 1-based line the error was reported on.
    #[must_use]
    pub fn line(&self) -> usize {
        match self {
            ParseError::Unexpected { line, .. }
            | ParseError::DuplicateFlag { line, .. }
            | ParseError::UnclosedGroup { line, .. }
            | ParseError::UnmatchedParen { line, .. }
            | ParseError::OperatorConflict { line, .. }
            | ParseError::NonNaturalQuantity { line, .. }
            | ParseError::QuantityTarget { line, .. }
            | ParseError::DuplicateRule { line, .. }
            | ParseError::DuplicateGoal { line, .. }
            | ParseError::UnrecognizedFlag { line, .. }
            | ParseError::DuplicateReward { line, .. }
            | ParseError::DuplicateLabel { line, .. }
            | ParseError::UnlabeledReward { line, .. } => *line,
        }
    }
}
