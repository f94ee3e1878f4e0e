use std::collections::HashSet;
use std::mem;

use tracing::trace;

use super::error::ParseError;
use super::lexer::tokenize;
use super::parser::{GoalMarker, ParsedRules};
use crate::types::{
    Argument, Condition, ConditionKind, Flag, FlagValue, Flags, Operator, Rule, Token, TokenKind,
};

const TABLE: &str = "rules";

/// Position of the rule-line state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Name,
    NameSemi,
    FlagOrSemi,
    PostFlag,
    Flag,
    FlagArg,
    FlagArgEnd,
    PostFlagArg,
    CondOrSemi,
    PostCond,
    Cond,
    Loc,
    Fn,
    PostFn,
    FnArg,
    FnArgEnd,
    End,
    Goal,
    PreItemCount,
    PostItemCount,
}

impl State {
    fn expected(self) -> &'static str {
        match self {
            State::Name => "name or `#`",
            State::NameSemi => "`;`",
            State::FlagOrSemi => "flag or `;`",
            State::PostFlag => "`;`, `|`, or `(`",
            State::Flag => "flag",
            State::PostFlagArg => "`;` or `|`",
            State::FlagArg | State::FnArg => "text or number",
            State::FlagArgEnd | State::FnArgEnd | State::PostItemCount => "`)`",
            State::CondOrSemi => "name, `#`, `@`, `~`, `(`, or `;`",
            State::PostCond => "`;`, `&`, `|`, or `)`",
            State::Cond => "name, `#`, `@`, `~`, or `(`",
            State::Loc | State::Fn => "name",
            State::PostFn => "`(`, `;`, `&`, `|`, or `)`",
            State::End => "end of line",
            State::Goal => "goal",
            State::PreItemCount => "number",
        }
    }

    fn accepts_end(self) -> bool {
        matches!(
            self,
            State::Name | State::FlagOrSemi | State::CondOrSemi | State::End
        )
    }
}

/// Saved enclosing level while a parenthesized group is open.
#[derive(Debug)]
struct Frame {
    sign: bool,
    operator: Option<Operator>,
    conditions: Vec<Condition>,
}

/// What one line of the rule table declared.
#[derive(Debug, PartialEq)]
pub(crate) enum Line {
    Blank,
    Goal(String),
    Rule(Rule),
}

struct LineParser {
    line: usize,
    state: State,
    name: Option<String>,
    goal: Option<String>,
    flags: Vec<(String, FlagValue)>,
    function: Option<String>,
    sign: bool,
    operator: Option<Operator>,
    conditions: Vec<Condition>,
    outer: Vec<Frame>,
}

impl LineParser {
    fn new(line: usize) -> Self {
        Self {
            line,
            state: State::Name,
            name: None,
            goal: None,
            flags: Vec::new(),
            function: None,
            sign: true,
            operator: None,
            conditions: Vec::new(),
            outer: Vec::new(),
        }
    }

    fn unexpected(&self, column: usize, found: String) -> ParseError {
        ParseError::Unexpected {
            table: TABLE,
            line: self.line,
            column,
            found,
            expected: self.state.expected(),
        }
    }

    fn step(&mut self, token: Token) -> Result<(), ParseError> {
        let column = token.column + 1;
        let kind = token.kind;
        self.state = match (self.state, kind) {
            (State::Name, TokenKind::Ident(name)) => {
                self.name = Some(name);
                State::NameSemi
            }
            (State::Name, TokenKind::Hash) => State::Goal,
            (State::Goal, TokenKind::Ident(goal)) => {
                self.goal = Some(goal);
                State::End
            }
            (State::NameSemi, TokenKind::Semi) => State::FlagOrSemi,

            (State::FlagOrSemi | State::Flag, TokenKind::Ident(flag)) => {
                if self.flags.iter().any(|(f, _)| *f == flag) {
                    return Err(ParseError::DuplicateFlag {
                        table: TABLE,
                        flag,
                        line: self.line,
                        column,
                    });
                }
                self.flags.push((flag, FlagValue::None));
                State::PostFlag
            }
            (State::FlagOrSemi | State::PostFlag | State::PostFlagArg, TokenKind::Semi) => {
                State::CondOrSemi
            }
            (State::PostFlag | State::PostFlagArg, TokenKind::Or) => State::Flag,
            (State::PostFlag, TokenKind::LParen) => State::FlagArg,
            (State::FlagArg, TokenKind::Ident(text)) => self.set_flag_value(FlagValue::Text(text)),
            (State::FlagArg, TokenKind::Number(n)) => self.set_flag_value(FlagValue::Number(n)),
            (State::FlagArgEnd, TokenKind::RParen) => State::PostFlagArg,

            (State::CondOrSemi, TokenKind::Semi) => State::End,
            (State::CondOrSemi | State::Cond, TokenKind::Ident(name)) => {
                self.push(ConditionKind::Item { name, quantity: 1 });
                State::PostCond
            }
            (State::CondOrSemi | State::Cond, TokenKind::Hash) => State::Loc,
            (State::CondOrSemi | State::Cond, TokenKind::At) => State::Fn,
            (State::CondOrSemi | State::Cond, TokenKind::Not) => {
                self.sign = !self.sign;
                State::Cond
            }
            (State::CondOrSemi | State::Cond, TokenKind::LParen) => {
                self.open_group();
                State::Cond
            }
            (State::Loc, TokenKind::Ident(name)) => {
                self.push(ConditionKind::Location(name));
                State::PostCond
            }
            (State::Fn, TokenKind::Ident(name)) => {
                self.function = Some(name);
                State::PostFn
            }
            (State::PostFn, TokenKind::LParen) => State::FnArg,
            (
                State::PostFn,
                kind @ (TokenKind::Semi | TokenKind::And | TokenKind::Or | TokenKind::RParen),
            ) => {
                self.push_function(None);
                self.post_condition(column, kind)?
            }
            (State::FnArg, TokenKind::Ident(text)) => {
                self.push_function(Some(Argument::Text(text)));
                State::FnArgEnd
            }
            (State::FnArg, TokenKind::Number(n)) => {
                self.push_function(Some(Argument::Number(n)));
                State::FnArgEnd
            }
            (State::FnArgEnd, TokenKind::RParen) => State::PostCond,

            (State::PostCond, TokenKind::LParen) => {
                let is_item = matches!(
                    self.conditions.last(),
                    Some(Condition {
                        kind: ConditionKind::Item { .. },
                        ..
                    })
                );
                if !is_item {
                    return Err(ParseError::QuantityTarget {
                        table: TABLE,
                        line: self.line,
                        column,
                    });
                }
                State::PreItemCount
            }
            (State::PostCond, kind) => self.post_condition(column, kind)?,
            (State::PreItemCount, TokenKind::Number(n)) => {
                if n < 1 {
                    return Err(ParseError::NonNaturalQuantity {
                        table: TABLE,
                        line: self.line,
                        column,
                        value: n,
                    });
                }
                if let Some(last) = self.conditions.pop() {
                    self.conditions.push(last.times(n));
                }
                State::PostItemCount
            }
            (State::PostItemCount, TokenKind::RParen) => State::PostCond,

            (_, kind) => return Err(self.unexpected(column, kind.describe())),
        };
        Ok(())
    }

    fn set_flag_value(&mut self, value: FlagValue) -> State {
        if let Some((_, slot)) = self.flags.last_mut() {
            *slot = value;
        }
        State::FlagArgEnd
    }

    fn push(&mut self, kind: ConditionKind) {
        self.conditions.push(Condition {
            sign: self.sign,
            kind,
        });
        self.sign = true;
    }

    fn push_function(&mut self, argument: Option<Argument>) {
        let name = self.function.take().unwrap_or_default();
        self.push(ConditionKind::Function { name, argument });
    }

    fn open_group(&mut self) {
        self.outer.push(Frame {
            sign: self.sign,
            operator: self.operator.take(),
            conditions: mem::take(&mut self.conditions),
        });
        self.sign = true;
    }

    /// Handle a separator or closing token after a complete condition.
    fn post_condition(&mut self, column: usize, kind: TokenKind) -> Result<State, ParseError> {
        match kind {
            TokenKind::Semi => {
                if !self.outer.is_empty() {
                    return Err(ParseError::UnclosedGroup {
                        table: TABLE,
                        line: self.line,
                        column,
                    });
                }
                Ok(State::End)
            }
            TokenKind::And => self.set_operator(Operator::And, column),
            TokenKind::Or => self.set_operator(Operator::Or, column),
            TokenKind::RParen => {
                let Some(frame) = self.outer.pop() else {
                    return Err(ParseError::UnmatchedParen {
                        table: TABLE,
                        line: self.line,
                        column,
                    });
                };
                let group = Condition {
                    sign: frame.sign,
                    kind: ConditionKind::Group {
                        operator: mem::replace(&mut self.operator, frame.operator),
                        conditions: mem::replace(&mut self.conditions, frame.conditions),
                    },
                };
                self.conditions.push(group);
                self.sign = true;
                Ok(State::PostCond)
            }
            other => Err(self.unexpected(column, other.describe())),
        }
    }

    fn set_operator(&mut self, operator: Operator, column: usize) -> Result<State, ParseError> {
        match self.operator {
            Some(existing) if existing != operator => Err(ParseError::OperatorConflict {
                table: TABLE,
                line: self.line,
                column,
                found: operator.symbol(),
                existing: existing.symbol(),
            }),
            _ => {
                self.operator = Some(operator);
                Ok(State::Cond)
            }
        }
    }

    fn finish(self, end_column: usize) -> Result<Line, ParseError> {
        if !self.state.accepts_end() {
            return Err(self.unexpected(end_column, "end of line".to_owned()));
        }
        if let Some(goal) = self.goal {
            return Ok(Line::Goal(goal));
        }
        let Some(name) = self.name else {
            return Ok(Line::Blank);
        };

        let mut flags = Flags::new();
        for (flag_name, value) in self.flags {
            let Some(flag) = Flag::from_name(&flag_name) else {
                return Err(ParseError::UnrecognizedFlag {
                    table: TABLE,
                    rule: name,
                    flag: flag_name,
                    line: self.line,
                });
            };
            flags.insert(flag, value);
        }

        Ok(Line::Rule(Rule {
            name,
            flags,
            operator: self.operator,
            conditions: self.conditions,
            line: self.line,
        }))
    }
}

/// Parse a single rule-table line. `line` is the 1-based line number used in
/// error positions.
pub(crate) fn parse_line(text: &str, line: usize) -> Result<Line, ParseError> {
    let tokens = tokenize(text);
    let end_column = tokens
        .last()
        .map_or(1, |t| t.column + t.kind.to_string().chars().count() + 1);
    let mut parser = LineParser::new(line);
    for token in tokens {
        parser.step(token)?;
    }
    parser.finish(end_column)
}

/// Parse a whole rule table.
///
/// # Errors
///
/// Returns the first [`ParseError`] encountered; no partial table is produced.
pub fn parse_rules(input: &str) -> Result<ParsedRules, ParseError> {
    let mut parsed = ParsedRules::default();
    let mut rule_names = HashSet::new();
    let mut goal_names = HashSet::new();

    for (i, text) in input.lines().enumerate() {
        let line = i + 1;
        match parse_line(text, line)? {
            Line::Blank => {}
            Line::Goal(name) => {
                if !goal_names.insert(name.clone()) {
                    return Err(ParseError::DuplicateGoal {
                        table: TABLE,
                        name,
                        line,
                    });
                }
                trace!(goal = %name, end = parsed.rules.len(), "goal marker");
                parsed.goals.push(GoalMarker {
                    name,
                    end: parsed.rules.len(),
                    line,
                });
            }
            Line::Rule(rule) => {
                if !rule_names.insert(rule.name.clone()) {
                    return Err(ParseError::DuplicateRule {
                        table: TABLE,
                        name: rule.name,
                        line,
                    });
                }
                parsed.rules.push(rule);
            }
        }
    }

    Ok(parsed)
}
