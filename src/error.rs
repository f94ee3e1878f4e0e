use thiserror::Error;

use crate::parse::ParseError;
use crate::types::{CompileError, EvalError};

/// Unified error type covering parsing, compilation, evaluation, and I/O.
///
/// Returned by convenience methods like [`RuleTable::from_dsl()`](crate::RuleTable::from_dsl)
/// and [`RuleTable::from_files()`](crate::RuleTable::from_files).
#[derive(Debug, Error)]
pub enum DslError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Serialize(#[from] crate::serial::SerializeError),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Deserialize(#[from] crate::serial::DeserializeError),
}
