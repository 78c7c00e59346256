use logos::Logos;
use std::fmt;

/// Token of a single condition or instruction segment.
///
/// Segment bodies arrive already split out of their `[?...]`/`[!...]`
/// brackets, so chain connectors and brackets never reach this lexer.
/// Multi-word names arrive as consecutive `Word`s; the parser joins them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `+=`: add to a value, or "contains" in a condition.
    AddAssign,
    /// `-=`: remove from a value, or "does not contain" in a condition.
    RemoveAssign,
    /// `==`
    Equals,
    /// `<>`
    NotEquals,
    /// `<=`
    EqualsOrLess,
    /// `>=`
    EqualsOrMore,
    /// `=`
    Assign,
    /// `<`
    Less,
    /// `>`
    More,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `@`
    At,
    /// `#`
    Hash,
    /// `:`
    Colon,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `,`
    Comma,
    /// A run of ordinary characters, with escapes resolved.
    Word(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::AddAssign => write!(f, "+="),
            Token::RemoveAssign => write!(f, "-="),
            Token::Equals => write!(f, "=="),
            Token::NotEquals => write!(f, "<>"),
            Token::EqualsOrLess => write!(f, "<="),
            Token::EqualsOrMore => write!(f, ">="),
            Token::Assign => write!(f, "="),
            Token::Less => write!(f, "<"),
            Token::More => write!(f, ">"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::At => write!(f, "@"),
            Token::Hash => write!(f, "#"),
            Token::Colon => write!(f, ":"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
            Token::Word(w) => write!(f, "{w}"),
        }
    }
}

/// Internal logos token, converted to an owned `Token` after lexing.
#[derive(Logos, Debug)]
#[logos(skip r"[ \t\r\n]+")]
enum RawToken {
    #[token("+=")]
    AddAssign,

    #[token("-=")]
    RemoveAssign,

    #[token("==")]
    Equals,

    #[token("<>")]
    NotEquals,

    #[token("<=")]
    EqualsOrLess,

    #[token(">=")]
    EqualsOrMore,

    #[token("=")]
    Assign,

    #[token("<")]
    Less,

    #[token(">")]
    More,

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("@")]
    At,

    #[token("#")]
    Hash,

    #[token(":")]
    Colon,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token(",")]
    Comma,

    #[regex(r#"([^ \t\r\n+\-*/@#:(),=<>&|!?\[\]{}"\\]|\\[^\r\n])+"#)]
    Word,
}

/// A lexer error with source location.
#[derive(Debug, Clone)]
pub struct LexError {
    /// Byte range of the erroneous input in the segment.
    pub span: std::ops::Range<usize>,
    /// Human-readable description of the lexer error.
    pub message: String,
}

/// Lex a segment body into `(Token, Span)` pairs.
///
/// Lexing continues past errors so every bad character gets reported.
pub fn lex(source: &str) -> (Vec<(Token, std::ops::Range<usize>)>, Vec<LexError>) {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();
    let mut lexer = RawToken::lexer(source);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let token = match result {
            Ok(RawToken::AddAssign) => Token::AddAssign,
            Ok(RawToken::RemoveAssign) => Token::RemoveAssign,
            Ok(RawToken::Equals) => Token::Equals,
            Ok(RawToken::NotEquals) => Token::NotEquals,
            Ok(RawToken::EqualsOrLess) => Token::EqualsOrLess,
            Ok(RawToken::EqualsOrMore) => Token::EqualsOrMore,
            Ok(RawToken::Assign) => Token::Assign,
            Ok(RawToken::Less) => Token::Less,
            Ok(RawToken::More) => Token::More,
            Ok(RawToken::Plus) => Token::Plus,
            Ok(RawToken::Minus) => Token::Minus,
            Ok(RawToken::Star) => Token::Star,
            Ok(RawToken::Slash) => Token::Slash,
            Ok(RawToken::At) => Token::At,
            Ok(RawToken::Hash) => Token::Hash,
            Ok(RawToken::Colon) => Token::Colon,
            Ok(RawToken::LParen) => Token::LParen,
            Ok(RawToken::RParen) => Token::RParen,
            Ok(RawToken::Comma) => Token::Comma,
            Ok(RawToken::Word) => Token::Word(crate::tokenizer::unescape(lexer.slice())),
            Err(()) => {
                errors.push(LexError {
                    span: span.clone(),
                    message: format!("unexpected character: {:?}", &source[span.clone()]),
                });
                continue;
            }
        };
        tokens.push((token, span));
    }

    (tokens, errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<String> {
        let (tokens, errors) = lex(source);
        assert!(errors.is_empty(), "errors: {errors:?}");
        tokens.iter().map(|(t, _)| t.to_string()).collect()
    }

    #[test]
    fn compound_operators_win_over_single() {
        assert_eq!(kinds("apple+=red"), ["apple", "+=", "red"]);
        assert_eq!(kinds("a<>b"), ["a", "<>", "b"]);
        assert_eq!(kinds("a<=#3"), ["a", "<=", "#", "3"]);
        assert_eq!(kinds("a-b"), ["a", "-", "b"]);
    }

    #[test]
    fn multi_word_names_are_separate_words() {
        assert_eq!(kinds("big door:open"), ["big", "door", ":", "open"]);
    }

    #[test]
    fn escapes_are_resolved_in_words() {
        let (tokens, _) = lex(r"a\,b");
        assert_eq!(tokens[0].0, Token::Word("a,b".to_string()));
    }

    #[test]
    fn calls_and_unions() {
        assert_eq!(
            kinds("Size(@bag),x"),
            ["Size", "(", "@", "bag", ")", ",", "x"]
        );
    }

    #[test]
    fn stray_brackets_are_errors() {
        let (_, errors) = lex("a]b");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].span, 1..2);
    }
}
