use std::fmt;

/// One lexical unit of a DSL line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Ident(String),
    Number(u64),
    Semi,
    Hash,
    At,
    Not,
    And,
    Or,
    LParen,
    RParen,
}

impl TokenKind {
    /// The punctuation token for `c`, if `c` is punctuation.
    #[must_use]
    pub fn punctuation(c: char) -> Option<TokenKind> {
        Some(match c {
            ';' => TokenKind::Semi,
            '#' => TokenKind::Hash,
            '@' => TokenKind::At,
            '~' => TokenKind::Not,
            '&' => TokenKind::And,
            '|' => TokenKind::Or,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            _ => return None,
        })
    }

    /// How the token is quoted in error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        format!("`{self}`")
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident(s) => f.write_str(s),
            TokenKind::Number(n) => write!(f, "{n}"),
            TokenKind::Semi => f.write_str(";"),
            TokenKind::Hash => f.write_str("#"),
            TokenKind::At => f.write_str("@"),
            TokenKind::Not => f.write_str("~"),
            TokenKind::And => f.write_str("&"),
            TokenKind::Or => f.write_str("|"),
            TokenKind::LParen => f.write_str("("),
            TokenKind::RParen => f.write_str(")"),
        }
    }
}

/// A token and the 0-based character column it starts at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub column: usize,
    pub kind: TokenKind,
}

impl Token {
    #[must_use]
    pub fn new(column: usize, kind: TokenKind) -> Self {
        Self { column, kind }
    }
}
