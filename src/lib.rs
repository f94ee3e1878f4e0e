//! A line-oriented rule DSL for game-content reachability logic.
//!
//! A rule table declares locations, items, and events, each with flags and a
//! boolean condition tree over items, other locations, and built-in
//! functions. A reward table lists filler items grouped under labels. Both
//! are parsed, validated, and compiled into a [`RuleTable`], which is then
//! bound to one configuration as a [`Session`] to answer reachability
//! queries and mark progression items.
//!
//! ```
//! use reachdsl::{Inventory, Options, RuleTable};
//!
//! let table = RuleTable::from_dsl(
//!     "Wood;Item;\nWorkbench;Location;Wood;\n#crafting",
//!     "#filler\nTorch;Normal;",
//! )
//! .unwrap();
//! let session = table.session(Options::new()).unwrap();
//! assert!(session.can_reach("Workbench", &Inventory::new().with("Wood", 1)).unwrap());
//! assert!(session.mark_progression().unwrap().contains("Wood"));
//! ```

mod classify;
mod compile;
mod error;
mod evaluate;
mod options;
pub mod parse;
mod progression;
#[cfg(feature = "binary-cache")]
pub mod serial;
mod types;

pub use classify::{class_acceptable, codes_for, FlagCode, FlagTable, RuleClass};
pub use error::DslError;
pub use evaluate::combine;
pub use options::{ClassPreference, Options, WorldEvil};
pub use parse::ParseError;
pub use progression::{Progression, ProgressionSet};
pub use types::{
    function, goal_slug, group, item, location, Argument, Builtin, CollectionState,
    CompileError, CompiledCondition, CompiledRule, Condition, ConditionKind, EvalError, Flag,
    FlagValue, Flags, Goal, Inventory, Label, Operator, Reward, Rule, RuleTable,
    RuleTableBuilder, Session, Token, TokenKind, REWARD_PREFIX,
};

#[cfg(feature = "binary-cache")]
pub use serial::{DeserializeError, SerializeError};
