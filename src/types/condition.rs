use std::fmt;
use std::ops::Not;

use super::builtin::Builtin;

/// Combinator joining the conditions of one nesting level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    And,
    Or,
}

impl Operator {
    #[must_use]
    pub fn symbol(self) -> char {
        match self {
            Operator::And => '&',
            Operator::Or => '|',
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// The single optional argument of a function call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Argument {
    Text(String),
    Number(u64),
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Text(s) => f.write_str(&escape(s)),
            Argument::Number(n) => write!(f, "{n}"),
        }
    }
}

/// What a [`Condition`] tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionKind {
    /// Holds `quantity` copies of the item produced by the named rule.
    Item { name: String, quantity: u64 },
    /// The named rule's own condition tree is satisfied.
    Location(String),
    /// A built-in function, resolved against the registry at compile time.
    Function {
        name: String,
        argument: Option<Argument>,
    },
    /// A parenthesized sub-expression.
    Group {
        operator: Option<Operator>,
        conditions: Vec<Condition>,
    },
}

/// A signed test inside a rule's logic, as written in the rule table.
///
/// Names are unresolved strings; [`CompiledCondition`] is the form the
/// evaluator walks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    /// `true` for a positive test, `false` when negated with `~`.
    pub sign: bool,
    pub kind: ConditionKind,
}

impl Condition {
    #[must_use]
    pub fn new(kind: ConditionKind) -> Self {
        Self { sign: true, kind }
    }

    /// Require `quantity` copies instead of one. Only meaningful on item
    /// references; other kinds are returned unchanged.
    #[must_use]
    pub fn times(mut self, quantity: u64) -> Self {
        if let ConditionKind::Item { quantity: q, .. } = &mut self.kind {
            *q = quantity;
        }
        self
    }
}

impl Not for Condition {
    type Output = Condition;

    fn not(mut self) -> Condition {
        self.sign = !self.sign;
        self
    }
}

#[must_use]
pub fn item(name: &str) -> Condition {
    Condition::new(ConditionKind::Item {
        name: name.to_owned(),
        quantity: 1,
    })
}

#[must_use]
pub fn location(name: &str) -> Condition {
    Condition::new(ConditionKind::Location(name.to_owned()))
}

#[must_use]
pub fn function(name: &str, argument: Option<Argument>) -> Condition {
    Condition::new(ConditionKind::Function {
        name: name.to_owned(),
        argument,
    })
}

#[must_use]
pub fn group(operator: Option<Operator>, conditions: Vec<Condition>) -> Condition {
    Condition::new(ConditionKind::Group {
        operator,
        conditions,
    })
}

/// Escape a name so the lexer reads it back as one identifier.
pub(crate) fn escape(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev = None;
    for (i, c) in name.chars().enumerate() {
        let special = matches!(c, ';' | '#' | '@' | '~' | '&' | '|' | '(' | ')' | '\\')
            || (i == 0 && c.is_ascii_digit())
            || (c == '/' && prev == Some('/'));
        if special {
            out.push('\\');
        }
        out.push(c);
        prev = Some(c);
    }
    out
}

/// Write `conditions` joined by `operator`, the way they appear in a rule line.
pub(crate) fn write_joined(
    f: &mut fmt::Formatter<'_>,
    operator: Option<Operator>,
    conditions: &[Condition],
) -> fmt::Result {
    let sep = match operator {
        Some(op) => format!(" {op} "),
        None => " ".to_owned(),
    };
    for (i, cond) in conditions.iter().enumerate() {
        if i > 0 {
            f.write_str(&sep)?;
        }
        write!(f, "{cond}")?;
    }
    Ok(())
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.sign {
            f.write_str("~")?;
        }
        match &self.kind {
            ConditionKind::Item { name, quantity } => {
                write!(f, "{}", escape(name))?;
                if *quantity != 1 {
                    write!(f, "({quantity})")?;
                }
                Ok(())
            }
            ConditionKind::Location(name) => write!(f, "#{}", escape(name)),
            ConditionKind::Function { name, argument } => match argument {
                Some(arg) => write!(f, "@{name}({arg})"),
                None => write!(f, "@{name}"),
            },
            ConditionKind::Group {
                operator,
                conditions,
            } => {
                f.write_str("(")?;
                write_joined(f, *operator, conditions)?;
                f.write_str(")")
            }
        }
    }
}

/// Compiled condition with rule references resolved to table indices and
/// function names resolved to [`Builtin`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledCondition {
    pub(crate) sign: bool,
    pub(crate) kind: CompiledKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CompiledKind {
    Item {
        rule: usize,
        quantity: u64,
    },
    Location(usize),
    Function {
        builtin: Builtin,
        argument: Option<Argument>,
    },
    Group {
        operator: Option<Operator>,
        conditions: Vec<CompiledCondition>,
    },
}

impl CompiledCondition {
    #[must_use]
    pub fn sign(&self) -> bool {
        self.sign
    }

    /// Child conditions when this is a group, otherwise an empty slice.
    #[must_use]
    pub fn children(&self) -> &[CompiledCondition] {
        match &self.kind {
            CompiledKind::Group { conditions, .. } => conditions,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_defaults_to_quantity_one() {
        assert_eq!(
            item("Wood"),
            Condition {
                sign: true,
                kind: ConditionKind::Item {
                    name: "Wood".to_owned(),
                    quantity: 1,
                },
            }
        );
    }

    #[test]
    fn double_not_cancels() {
        assert_eq!(!!item("Wood"), item("Wood"));
        assert!(!(!item("Wood")).sign);
    }

    #[test]
    fn times_only_rewrites_items() {
        assert_eq!(
            item("Wood").times(3).kind,
            ConditionKind::Item {
                name: "Wood".to_owned(),
                quantity: 3,
            }
        );
        assert_eq!(location("Dungeon").times(3), location("Dungeon"));
    }

    #[test]
    fn escape_marks_punctuation_and_leading_digits() {
        assert_eq!(escape("Wall of Flesh"), "Wall of Flesh");
        assert_eq!(escape("A&B"), "A\\&B");
        assert_eq!(escape("2nd"), "\\2nd");
        assert_eq!(escape("a//b"), "a/\\/b");
    }

    #[test]
    fn display_renders_dsl_syntax() {
        let cond = group(
            Some(Operator::Or),
            vec![
                item("Wood").times(10),
                !location("Dungeon"),
                function("npc", Some(Argument::Number(2))),
                function("calamity", None),
            ],
        );
        assert_eq!(cond.to_string(), "(Wood(10) | ~#Dungeon | @npc(2) | @calamity)");
    }
}
