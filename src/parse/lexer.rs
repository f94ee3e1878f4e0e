use winnow::combinator::{alt, not, opt, preceded, repeat};
use winnow::error::ModalResult;
use winnow::prelude::*;
use winnow::token::{any, none_of, take_while};

use crate::types::{Token, TokenKind};

const RESERVED: [char; 9] = [';', '#', '@', '~', '&', '|', '(', ')', '\\'];

// -- Pieces -----------------------------------------------------------------

fn space<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    take_while(0.., char::is_whitespace).parse_next(input)
}

fn punctuation(input: &mut &str) -> ModalResult<TokenKind> {
    any.verify_map(TokenKind::punctuation).parse_next(input)
}

/// A run of digits. Overlong numbers saturate instead of failing the line.
fn number(input: &mut &str) -> ModalResult<u64> {
    take_while(1.., |c: char| c.is_ascii_digit())
        .map(|digits: &str| {
            digits.bytes().fold(0_u64, |n, d| {
                n.saturating_mul(10).saturating_add(u64::from(d - b'0'))
            })
        })
        .parse_next(input)
}

/// `\x` folds `x` into the identifier verbatim. A trailing lone backslash
/// contributes nothing. An escaped `/` directly followed by `/` still opens a
/// comment, which swallows the rest of the line.
fn escaped(input: &mut &str) -> ModalResult<Option<char>> {
    let c = preceded('\\', opt(any)).parse_next(input)?;
    if c == Some('/') && input.starts_with('/') {
        *input = "";
        return Ok(None);
    }
    Ok(c)
}

fn plain(input: &mut &str) -> ModalResult<Option<char>> {
    preceded(not("//"), none_of(RESERVED))
        .map(Some)
        .parse_next(input)
}

/// Identifier text up to the next punctuation or comment. Inner whitespace is
/// kept, trailing whitespace is not.
fn text(input: &mut &str) -> ModalResult<String> {
    repeat(1.., alt((escaped, plain)))
        .fold(String::new, |mut acc, c| {
            if let Some(c) = c {
                acc.push(c);
            }
            acc
        })
        .map(|s: String| s.trim_end().to_owned())
        .parse_next(input)
}

fn token(input: &mut &str) -> ModalResult<Option<TokenKind>> {
    alt((
        punctuation.map(Some),
        number.map(|n| Some(TokenKind::Number(n))),
        text.map(|s| (!s.is_empty()).then_some(TokenKind::Ident(s))),
    ))
    .parse_next(input)
}

// -- Entry point ------------------------------------------------------------

/// Split one line of DSL text into positioned tokens.
///
/// Never fails: a `//` ends the line, empty identifiers are dropped, and
/// anything after an unlexable position is ignored.
#[must_use]
pub fn tokenize(line: &str) -> Vec<Token> {
    let mut input = line;
    let mut tokens = Vec::new();
    loop {
        if space.parse_next(&mut input).is_err() {
            break;
        }
        if input.is_empty() || input.starts_with("//") {
            break;
        }
        let column = line[..line.len() - input.len()].chars().count();
        match token.parse_next(&mut input) {
            Ok(Some(kind)) => tokens.push(Token::new(column, kind)),
            Ok(None) => {}
            Err(_) => break,
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(line: &str) -> Vec<TokenKind> {
        tokenize(line).into_iter().map(|t| t.kind).collect()
    }

    fn ident(s: &str) -> TokenKind {
        TokenKind::Ident(s.to_owned())
    }

    #[test]
    fn punctuation_and_identifiers() {
        assert_eq!(
            kinds("A;Item;#B&@npc(2);"),
            vec![
                ident("A"),
                TokenKind::Semi,
                ident("Item"),
                TokenKind::Semi,
                TokenKind::Hash,
                ident("B"),
                TokenKind::And,
                TokenKind::At,
                ident("npc"),
                TokenKind::LParen,
                TokenKind::Number(2),
                TokenKind::RParen,
                TokenKind::Semi,
            ]
        );
    }

    #[test]
    fn inner_spaces_kept_trailing_trimmed() {
        assert_eq!(
            kinds("  Wall of Flesh   ; Goal"),
            vec![ident("Wall of Flesh"), TokenKind::Semi, ident("Goal")]
        );
    }

    #[test]
    fn columns_count_characters() {
        let tokens = tokenize("é;  x");
        assert_eq!(tokens[0].column, 0);
        assert_eq!(tokens[1].column, 1);
        assert_eq!(tokens[2].column, 4);
    }

    #[test]
    fn escapes_fold_into_identifier() {
        assert_eq!(kinds(r"A\;B;"), vec![ident("A;B"), TokenKind::Semi]);
        assert_eq!(kinds(r"\2nd"), vec![ident("2nd")]);
        assert_eq!(kinds(r"a\\b"), vec![ident(r"a\b")]);
    }

    #[test]
    fn number_closed_by_non_digit() {
        assert_eq!(kinds("12ab"), vec![TokenKind::Number(12), ident("ab")]);
        assert_eq!(kinds("a12"), vec![ident("a12")]);
        assert_eq!(kinds("(35)"), vec![TokenKind::LParen, TokenKind::Number(35), TokenKind::RParen]);
    }

    #[test]
    fn comment_truncates_line() {
        assert_eq!(kinds("A; // trailing"), vec![ident("A"), TokenKind::Semi]);
        assert_eq!(kinds("Copper Bar// note"), vec![ident("Copper Bar")]);
        assert_eq!(kinds("// whole line"), Vec::<TokenKind>::new());
        assert_eq!(kinds(r"a/\/b"), vec![ident("a//b")]);
        assert_eq!(kinds(r"a\//b"), vec![ident("a")]);
        assert_eq!(kinds(r"A;\//c"), vec![ident("A"), TokenKind::Semi]);
        assert_eq!(kinds(r"a\/\/b"), vec![ident("a//b")]);
        assert_eq!(kinds("a/b"), vec![ident("a/b")]);
    }

    #[test]
    fn blank_and_empty_tokens_dropped() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \t").is_empty());
        assert!(tokenize(r"\").is_empty());
        assert_eq!(kinds(r"\ ;"), vec![TokenKind::Semi]);
    }

    #[test]
    fn huge_number_saturates() {
        assert_eq!(
            kinds("99999999999999999999999"),
            vec![TokenKind::Number(u64::MAX)]
        );
    }
}
