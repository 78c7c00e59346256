//! Story language for Folio: comment stripping, page definitions, block
//! expressions and the loaded story with its authoring diagnostics.

pub mod ast;
/// Authoring and runtime diagnostics.
pub mod diagnostics;
/// Errors raised while reading a story.
pub mod error;
/// Tokens of block expressions.
pub mod lexer;
pub mod page;
/// Block expression parser.
pub mod parser;
pub mod story;
pub mod tokenizer;

use std::path::Path;

pub use diagnostics::{Diagnostic, Diagnostics, Severity, render_diagnostics};
pub use error::{DslError, DslResult};
pub use story::Story;

/// Result of loading a story: the story plus any diagnostics.
#[derive(Debug)]
pub struct LoadResult {
    /// Everything that loaded, even when errors were reported.
    pub story: Story,
    /// Problems found while loading.
    pub diagnostics: Vec<Diagnostic>,
}

impl LoadResult {
    /// Whether any diagnostic is an error.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Blank out comments without moving any byte, so spans into the result are
/// spans into `source`.
fn blank_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    for line in source.split_inclusive('\n') {
        let content = line.strip_suffix('\n').unwrap_or(line);
        let kept = tokenizer::strip_comments(content);
        out.push_str(kept);
        out.extend(std::iter::repeat_n(' ', content.len() - kept.len()));
        if line.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

/// Byte offsets of every top-level `[` that opens a noun definition, i.e.
/// one outside text blocks and brackets that does not open a verb or an
/// expression.
fn definition_starts(text: &str) -> Vec<usize> {
    let bytes = text.as_bytes();
    let mut starts = Vec::new();
    let mut in_text = false;
    let mut depth = 0usize;
    let mut i = 0usize;
    while i < bytes.len() {
        let b = bytes[i];
        if b == tokenizer::ESCAPE as u8 {
            i += tokenizer::escape_width(text, i);
            continue;
        }
        if in_text {
            in_text = b != tokenizer::TEXT as u8;
        } else if b == tokenizer::TEXT as u8 {
            in_text = true;
        } else if b == tokenizer::BRACKET_OPEN as u8 {
            let next = text[i + 1..].trim_start().chars().next();
            let opens_definition = !matches!(
                next,
                Some(tokenizer::SCOPE | tokenizer::CONDITION | tokenizer::INSTRUCTION)
            );
            if depth == 0 && opens_definition {
                starts.push(i);
            }
            depth += 1;
        } else if b == tokenizer::BRACKET_CLOSE as u8 {
            depth = depth.saturating_sub(1);
        }
        i += 1;
    }
    starts
}

/// Parse a whole story source into a [`Story`].
///
/// Comments are stripped per line, then the source is split into keyword
/// definitions, each parsed in order. Patterns must be defined before the
/// pages that use them.
pub fn load_story(source: &str) -> LoadResult {
    let mut story = Story::new();
    let mut diagnostics = Diagnostics::new();
    let text = blank_comments(source);
    let starts = definition_starts(&text);

    let first = starts.first().copied().unwrap_or(text.len());
    if !text[..first].trim().is_empty() {
        diagnostics.warning(0..first, "text before the first definition is ignored");
    }

    for (k, &start) in starts.iter().enumerate() {
        let end = starts.get(k + 1).copied().unwrap_or(text.len());
        let header_end = tokenizer::find_token_end(&text, start, tokenizer::BRACKET)
            .map_or(end, |e| e.min(end));
        story.parse_keyword_definition(&text[start..end], start..header_end, &mut diagnostics);
    }

    tracing::info!(
        pages = story.page_count(),
        patterns = story.pattern_count(),
        diagnostics = diagnostics.len(),
        "story loaded"
    );

    LoadResult {
        story,
        diagnostics: diagnostics.into_vec(),
    }
}

/// Read and parse a story file.
pub fn load_story_file(path: &Path) -> DslResult<LoadResult> {
    let source = std::fs::read_to_string(path).map_err(|source| DslError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(load_story(&source))
}
