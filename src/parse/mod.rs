mod error;
mod lexer;
mod parser;
mod rewards;
mod rules;

pub use error::ParseError;
pub use lexer::tokenize;
pub use parser::{GoalMarker, ParsedRewards, ParsedRules};
pub use rewards::parse_rewards;
pub use rules::parse_rules;
