use std::collections::HashSet;

use super::error::ParseError;
use super::lexer::tokenize;
use super::parser::ParsedRewards;
use crate::types::{Label, Reward, TokenKind, REWARD_PREFIX};

const TABLE: &str = "rewards";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Name,
    NameSemi,
    Flag,
    FlagSemi,
    End,
    Label,
}

impl State {
    fn expected(self) -> &'static str {
        match self {
            State::Name => "name or `#`",
            State::NameSemi | State::FlagSemi => "`;`",
            State::Flag => "flag",
            State::End => "end of line",
            State::Label => "name",
        }
    }

    /// A reward line must declare exactly one flag, so only a finished entry,
    /// a label, or a blank line may end here.
    fn accepts_end(self) -> bool {
        matches!(self, State::Name | State::End)
    }
}

/// Parse a whole reward table.
///
/// Every reward belongs to the most recently declared `#label`.
///
/// # Errors
///
/// Returns the first [`ParseError`] encountered.
pub fn parse_rewards(input: &str) -> Result<ParsedRewards, ParseError> {
    let mut parsed = ParsedRewards::default();
    let mut reward_names = HashSet::new();
    let mut label_names = HashSet::new();

    for (i, text) in input.lines().enumerate() {
        let line = i + 1;
        let tokens = tokenize(text);
        let end_column = tokens
            .last()
            .map_or(1, |t| t.column + t.kind.to_string().chars().count() + 1);

        let mut state = State::Name;
        let mut name = None;
        let mut flag = None;

        for token in tokens {
            let column = token.column + 1;
            state = match (state, token.kind) {
                (State::Name, TokenKind::Ident(reward)) => {
                    name = Some(format!("{REWARD_PREFIX}{reward}"));
                    State::NameSemi
                }
                (State::Name, TokenKind::Hash) => State::Label,
                (State::NameSemi, TokenKind::Semi) => State::Flag,
                (State::Flag, TokenKind::Ident(f)) => {
                    flag = Some(f);
                    State::FlagSemi
                }
                (State::FlagSemi, TokenKind::Semi) => State::End,
                (State::Label, TokenKind::Ident(label)) => {
                    if !label_names.insert(label.clone()) {
                        return Err(ParseError::DuplicateLabel {
                            table: TABLE,
                            name: label,
                            line,
                            column,
                        });
                    }
                    parsed.labels.push(Label {
                        name: label,
                        rewards: Vec::new(),
                    });
                    State::End
                }
                (state, kind) => {
                    return Err(ParseError::Unexpected {
                        table: TABLE,
                        line,
                        column,
                        found: kind.describe(),
                        expected: state.expected(),
                    })
                }
            };
        }

        if !state.accepts_end() {
            return Err(ParseError::Unexpected {
                table: TABLE,
                line,
                column: end_column,
                found: "end of line".to_owned(),
                expected: state.expected(),
            });
        }

        let (Some(name), Some(flag)) = (name, flag) else {
            continue;
        };
        if !reward_names.insert(name.clone()) {
            return Err(ParseError::DuplicateReward {
                table: TABLE,
                name,
                line,
            });
        }
        let Some(label) = parsed.labels.last_mut() else {
            return Err(ParseError::UnlabeledReward {
                table: TABLE,
                name,
                line,
            });
        };
        label.rewards.push(name.clone());
        parsed.rewards.push(Reward { name, flag, line });
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_rewards_under_labels() {
        let parsed = parse_rewards(
            "#ordered\nTorch;Normal;\n// comment\n#random\nMoney Trough;Calamity;\nMagic Mirror;Normal;\n",
        )
        .unwrap();
        assert_eq!(parsed.labels.len(), 2);
        assert_eq!(parsed.labels[0].name, "ordered");
        assert_eq!(parsed.labels[0].rewards, vec!["Reward: Torch"]);
        assert_eq!(
            parsed.labels[1].rewards,
            vec!["Reward: Money Trough", "Reward: Magic Mirror"]
        );
        assert_eq!(parsed.rewards[1].flag, "Calamity");
        assert_eq!(parsed.rewards[1].line, 5);
    }

    #[test]
    fn reward_before_label_is_rejected() {
        assert!(matches!(
            parse_rewards("Torch;Normal;"),
            Err(ParseError::UnlabeledReward { line: 1, .. })
        ));
    }

    #[test]
    fn duplicates_are_rejected() {
        assert!(matches!(
            parse_rewards("#a\nTorch;X;\nTorch;Y;"),
            Err(ParseError::DuplicateReward { line: 3, .. })
        ));
        assert!(matches!(
            parse_rewards("#a\n#a"),
            Err(ParseError::DuplicateLabel { line: 2, column: 2, .. })
        ));
    }

    #[test]
    fn exactly_one_flag_required() {
        let err = parse_rewards("#a\nTorch;").unwrap_err();
        assert_eq!(
            err.to_string(),
            "in `rewards`, found end of line at 2:7; expected flag"
        );
        let err = parse_rewards("#a\nTorch;X|Y;").unwrap_err();
        assert_eq!(
            err.to_string(),
            "in `rewards`, found `|` at 2:8; expected `;`"
        );
    }
}
