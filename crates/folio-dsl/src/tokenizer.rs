//! Structural characters of story text and the scanners that locate them.
//!
//! Story text is scanned at the character level: tokens are either a single
//! character, a two-character "wide" marker, or a paired open/close with
//! nesting. A backslash suppresses the special meaning of the next character.

use std::ops::Range;

/// Opens and closes a literal text block.
pub const TEXT: char = '"';
/// Opens a keyword reference inside text.
pub const KEYWORD_OPEN: char = '<';
/// Closes a keyword reference inside text.
pub const KEYWORD_CLOSE: char = '>';
/// Opens a noun, verb or expression bracket.
pub const BRACKET_OPEN: char = '[';
/// Closes a noun, verb or expression bracket.
pub const BRACKET_CLOSE: char = ']';
/// Starts a condition.
pub const CONDITION: char = '?';
/// Starts an instruction.
pub const INSTRUCTION: char = '!';
/// Separates a noun from a verb.
pub const SCOPE: char = ':';
/// Opens an explicit block scope.
pub const BLOCK_OPEN: char = '{';
/// Closes an explicit block scope.
pub const BLOCK_CLOSE: char = '}';
/// Logical and between chained segments.
pub const AND: char = '&';
/// Logical or between chained segments.
pub const OR: char = '|';
/// Add (or contains, when followed by `=`).
pub const ADD: char = '+';
/// Remove (or does-not-contain, when followed by `=`).
pub const REMOVE: char = '-';
/// Assign.
pub const ASSIGN: char = '=';
/// Integer marker.
pub const INTEGER: char = '#';
/// Dereference marker.
pub const DEREFERENCE: char = '@';
/// Opens a function call.
pub const CALL_OPEN: char = '(';
/// Closes a function call.
pub const CALL_CLOSE: char = ')';
/// Separates atoms.
pub const SEPARATOR: char = ',';
/// Escape character.
pub const ESCAPE: char = '\\';
/// Marker of a line comment.
pub const COMMENT: &str = "//";
/// Repeated to form a break instruction (`!<<`).
pub const STOP: char = '<';

/// Kind of structural token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// One character, e.g. the scope separator `:`.
    Single(char),
    /// A two-character marker, e.g. `<=` or `//`.
    Wide(&'static str),
    /// An open/close pair whose inner occurrences nest, e.g. `[...]`.
    Paired {
        /// Opening character.
        open: char,
        /// Closing character.
        close: char,
    },
}

/// A quoted text block.
pub const TEXT_BLOCK: Token = Token::Paired {
    open: TEXT,
    close: TEXT,
};
/// A bracket span.
pub const BRACKET: Token = Token::Paired {
    open: BRACKET_OPEN,
    close: BRACKET_CLOSE,
};
/// An explicit scope span.
pub const BLOCK: Token = Token::Paired {
    open: BLOCK_OPEN,
    close: BLOCK_CLOSE,
};
/// A function call span.
pub const CALL: Token = Token::Paired {
    open: CALL_OPEN,
    close: CALL_CLOSE,
};
/// A keyword reference span.
pub const KEYWORD: Token = Token::Paired {
    open: KEYWORD_OPEN,
    close: KEYWORD_CLOSE,
};
/// A line comment marker.
pub const LINE_COMMENT: Token = Token::Wide(COMMENT);

/// Characters that start a statement inside a page body.
pub const STATEMENT_STARTS: &[char] = &[
    TEXT,
    INSTRUCTION,
    CONDITION,
    BRACKET_OPEN,
    BLOCK_OPEN,
    BLOCK_CLOSE,
];

const STRUCTURAL: &[char] = &[
    TEXT,
    KEYWORD_OPEN,
    KEYWORD_CLOSE,
    BRACKET_OPEN,
    BRACKET_CLOSE,
    CONDITION,
    INSTRUCTION,
    SCOPE,
    BLOCK_OPEN,
    BLOCK_CLOSE,
    AND,
    OR,
    ADD,
    REMOVE,
    ASSIGN,
    INTEGER,
    DEREFERENCE,
    CALL_OPEN,
    CALL_CLOSE,
    SEPARATOR,
];

/// Whether `c` is one of the structural characters of the token table.
pub fn is_structural(c: char) -> bool {
    STRUCTURAL.contains(&c)
}

/// Width in bytes of the escape sequence at `i`: the escape character plus
/// the whole character it escapes.
pub fn escape_width(text: &str, i: usize) -> usize {
    1 + text
        .get(i + 1..)
        .and_then(|rest| rest.chars().next())
        .map_or(0, char::len_utf8)
}

/// Find the start of the next unescaped occurrence of `token` at or after `from`.
///
/// For paired tokens this is the position of the opening character.
pub fn find_token_start(text: &str, from: usize, token: Token) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = from;
    while i < bytes.len() {
        if bytes[i] == ESCAPE as u8 {
            i += escape_width(text, i);
            continue;
        }
        let hit = match token {
            Token::Single(c) => bytes[i] == c as u8,
            Token::Wide(marker) => bytes[i..].starts_with(marker.as_bytes()),
            Token::Paired { open, .. } => bytes[i] == open as u8,
        };
        if hit {
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Find the exclusive end of the token whose opener sits at `start`.
///
/// Paired tokens honor nesting of the same pair; a pair whose open and close
/// characters coincide ends at the next unescaped close. Returns `None` when
/// `start` does not hold the token or a pair is never closed.
pub fn find_token_end(text: &str, start: usize, token: Token) -> Option<usize> {
    let bytes = text.as_bytes();
    match token {
        Token::Single(c) => (bytes.get(start) == Some(&(c as u8))).then_some(start + 1),
        Token::Wide(marker) => text
            .get(start..)
            .filter(|rest| rest.starts_with(marker))
            .map(|_| start + marker.len()),
        Token::Paired { open, close } => {
            if bytes.get(start) != Some(&(open as u8)) {
                return None;
            }
            let mut depth = 1usize;
            let mut i = start + 1;
            while i < bytes.len() {
                let b = bytes[i];
                if b == ESCAPE as u8 {
                    i += escape_width(text, i);
                    continue;
                }
                if b == close as u8 {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i + 1);
                    }
                } else if b == open as u8 {
                    depth += 1;
                }
                i += 1;
            }
            None
        }
    }
}

/// Locate the span of the next unescaped `token` at or after `from`.
pub fn find_token(text: &str, from: usize, token: Token) -> Option<Range<usize>> {
    let start = find_token_start(text, from, token)?;
    let end = find_token_end(text, start, token)?;
    Some(start..end)
}

/// Find the next unescaped character from `set` at or after `from`.
pub fn find_first_of(text: &str, from: usize, set: &[char]) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = from;
    while i < bytes.len() {
        let b = bytes[i];
        if b == ESCAPE as u8 {
            i += escape_width(text, i);
            continue;
        }
        if b.is_ascii() && set.contains(&(b as char)) {
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Split `text` on unescaped occurrences of any character in `set` that sit
/// outside parentheses. Returns the pieces with the separator that preceded each.
pub fn split_top_level<'a>(text: &'a str, set: &[char]) -> Vec<(Option<char>, &'a str)> {
    let bytes = text.as_bytes();
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut last = 0usize;
    let mut separator = None;
    let mut i = 0usize;
    while i < bytes.len() {
        let b = bytes[i];
        if b == ESCAPE as u8 {
            i += escape_width(text, i);
            continue;
        }
        if b == CALL_OPEN as u8 {
            depth += 1;
        } else if b == CALL_CLOSE as u8 {
            depth = depth.saturating_sub(1);
        } else if depth == 0 && b.is_ascii() && set.contains(&(b as char)) {
            pieces.push((separator, &text[last..i]));
            separator = Some(b as char);
            last = i + 1;
        }
        i += 1;
    }
    pieces.push((separator, &text[last..]));
    pieces
}

/// Truncate a line at the first unescaped comment marker.
pub fn strip_comments(line: &str) -> &str {
    match find_token_start(line, 0, LINE_COMMENT) {
        Some(pos) => &line[..pos],
        None => line,
    }
}

/// Remove escape characters, turning `\n` into a newline.
pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == ESCAPE {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some(other) => out.push(other),
                None => out.push(ESCAPE),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Normalize whitespace in a single pass.
///
/// - Inside a quoted text block (outside nested `<...>` markers) a whitespace
///   run holding a tab or newline becomes one space; plain spaces are kept.
/// - Elsewhere whitespace next to a structural character is dropped, other
///   runs collapse to one space.
/// - The escape `\n` becomes a literal newline; other escapes are kept.
/// - Adjacent text blocks `"a" "b"` merge into `"a\nb"`.
pub fn clean_whitespace(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_text = false;
    let mut keyword_depth = 0usize;
    let mut i = 0usize;

    while i < chars.len() {
        let c = chars[i];

        if c == ESCAPE {
            match chars.get(i + 1) {
                Some('n') => out.push('\n'),
                Some(&next) => {
                    out.push(ESCAPE);
                    out.push(next);
                }
                None => out.push(ESCAPE),
            }
            i += 2;
            continue;
        }

        if c.is_whitespace() {
            let start = i;
            while i < chars.len() && chars[i].is_whitespace() {
                i += 1;
            }
            let run = &chars[start..i];
            if in_text && keyword_depth == 0 {
                if run.iter().any(|w| *w == '\t' || *w == '\n' || *w == '\r') {
                    out.push(' ');
                } else {
                    out.extend(run.iter());
                }
            } else {
                let prev = out.chars().last();
                let next = chars.get(i).copied();
                let next_escaped = next == Some(ESCAPE);
                let touches_token = prev.is_none_or(is_structural)
                    || next.is_none()
                    || (!next_escaped && next.is_some_and(is_structural));
                if !touches_token {
                    out.push(' ');
                }
            }
            continue;
        }

        if in_text {
            if keyword_depth > 0 {
                if c == KEYWORD_CLOSE {
                    keyword_depth -= 1;
                } else if c == KEYWORD_OPEN {
                    keyword_depth += 1;
                }
                out.push(c);
            } else if c == KEYWORD_OPEN {
                keyword_depth = 1;
                out.push(c);
            } else if c == TEXT {
                let mut j = i + 1;
                while j < chars.len() && chars[j].is_whitespace() {
                    j += 1;
                }
                if chars.get(j) == Some(&TEXT) {
                    out.push('\n');
                    i = j + 1;
                    continue;
                }
                in_text = false;
                out.push(c);
            } else {
                out.push(c);
            }
        } else {
            if c == TEXT {
                in_text = true;
                keyword_depth = 0;
            }
            out.push(c);
        }
        i += 1;
    }

    out
}
