mod builtin;
mod condition;
mod error;
mod flag;
mod reward;
mod rule;
mod session;
mod state;
mod table;
mod token;

pub use builtin::Builtin;
pub use condition::{
    function, group, item, location, Argument, CompiledCondition, Condition, ConditionKind,
    Operator,
};
pub(crate) use condition::CompiledKind;
pub use error::{CompileError, EvalError};
pub use flag::{Flag, FlagValue, Flags};
pub use reward::{Label, Reward, REWARD_PREFIX};
pub use rule::{goal_slug, CompiledRule, Goal, Rule};
pub use session::Session;
pub use state::{CollectionState, Inventory};
pub(crate) use table::Capabilities;
pub use table::{RuleTable, RuleTableBuilder};
pub use token::{Token, TokenKind};
