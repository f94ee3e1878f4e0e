use thiserror::Error;

/// Errors found while validating and compiling parsed tables.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("item `{reference}` in `{rule}` is not defined")]
    UndefinedItem { rule: String, reference: String },

    #[error("location `{reference}` in `{rule}` is not defined")]
    UndefinedLocation { rule: String, reference: String },

    #[error("function `{function}` in `{rule}` is not defined")]
    UndefinedFunction { rule: String, function: String },

    #[error("`@{function}` in `{rule}` requires an integer argument")]
    BadArgument { rule: String, function: String },

    #[error("flag `{flag}` on `{rule}` requires an integer value")]
    BadFlagValue { rule: String, flag: String },

    #[error("rule `{rule}` belongs to goal `{goal}`, which is not declared")]
    UndefinedGoal { rule: String, goal: String },

    #[error("goal `{goal}` closes at rule {end}, past the end of the table")]
    GoalOutOfRange { goal: String, end: usize },

    #[error("goal `{goal}` closes before the goal declared ahead of it")]
    GoalOrder { goal: String },

    #[error("duplicate goal `{goal}`")]
    DuplicateGoal { goal: String },

    #[error("duplicate label `{label}`")]
    DuplicateLabel { label: String },

    #[error("reward `{reward}` does not belong to any label")]
    UnlabeledReward { reward: String },

    #[error("label `{label}` lists `{reward}`, which is not declared")]
    UndefinedReward { label: String, reward: String },

    #[error("duplicate rule name `{name}`")]
    DuplicateRule { name: String },

    #[error("item `{item}` on line {line} shadows a previous item")]
    DuplicateItem { item: String, line: usize },

    #[error("cyclic dependency detected: {}", path.join(" -> "))]
    CyclicDependency { path: Vec<String> },
}

/// Internal-consistency faults raised while evaluating or marking.
///
/// A compiled table never produces these; they indicate a hand-built or
/// corrupted condition tree, or a bad lookup by name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("found {count} conditions without an operator")]
    AmbiguousOperator { count: usize },

    #[error("`@{function}` requires an integer argument")]
    BadArgument { function: &'static str },

    #[error("goal `{goal}` is not declared")]
    UnknownGoal { goal: String },

    #[error("rule `{name}` is not declared")]
    UnknownRule { name: String },

    #[error("label `{label}` is not declared")]
    UnknownLabel { label: String },
}
