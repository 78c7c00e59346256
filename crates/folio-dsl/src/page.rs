//! Page parser: turns one noun definition's normalized body into verbs over a
//! block tree.
//!
//! Conditions open scopes. `?cond{...}` is explicit and ends at the matching
//! `}`; a bare `?cond` is implied and ends at the next condition or verb at the
//! same level. Conditions before the first verb (or directly ahead of a verb
//! declaration) are pending top-level guards, AND-folded into the root
//! expression of every verb declared while they are in scope.

use std::ops::Range;

use folio_core::{Block, BlockId, Page, Verb};

use crate::diagnostics::{Diagnostic, Diagnostics, Severity};
use crate::parser;
use crate::tokenizer::{
    self, BLOCK_CLOSE, BLOCK_OPEN, BRACKET, BRACKET_OPEN, CONDITION, INSTRUCTION, SCOPE,
    STATEMENT_STARTS, TEXT, TEXT_BLOCK,
};

const VERB_OPEN: &str = "[:";

#[derive(Debug, Clone, Copy)]
struct Scope {
    block: BlockId,
    implied: bool,
}

#[derive(Debug)]
struct Pending {
    expression: String,
    depth: usize,
    explicit: bool,
}

#[derive(Debug)]
struct OpenVerb {
    names: Vec<String>,
    root: BlockId,
}

struct PageParser<'a> {
    page: Page,
    text: &'a str,
    origin: Range<usize>,
    diagnostics: &'a mut Diagnostics,
    scopes: Vec<Scope>,
    verb: Option<OpenVerb>,
    pending: Vec<Pending>,
    depth: usize,
}

/// Parse `body` (already comment-stripped and whitespace-cleaned) into `page`.
///
/// Problems are reported to `diagnostics` against `origin`, the span of the
/// definition header in the story source; parsing always runs to the end.
pub fn parse_page(
    page: Page,
    body: &str,
    origin: Range<usize>,
    diagnostics: &mut Diagnostics,
) -> Page {
    let mut parser = PageParser {
        page,
        text: body,
        origin,
        diagnostics,
        scopes: Vec::new(),
        verb: None,
        pending: Vec::new(),
        depth: 0,
    };
    parser.run();
    let mut page = parser.finish();
    page.source = body.to_string();
    page
}

impl<'a> PageParser<'a> {
    fn run(&mut self) {
        let mut pos = 0usize;
        while pos < self.text.len() {
            let Some(c) = self.text[pos..].chars().next() else {
                break;
            };
            pos = match c {
                _ if c.is_whitespace() => pos + c.len_utf8(),
                TEXT => self.text_block(pos),
                INSTRUCTION => self.instruction(pos),
                CONDITION => self.condition(pos),
                BRACKET_OPEN => self.verb_declaration(pos),
                BLOCK_CLOSE => self.close_scope(pos),
                _ => {
                    self.report(
                        Severity::Error,
                        pos,
                        format!("unexpected character {c:?} at start of statement"),
                    );
                    self.statement_end(pos + c.len_utf8())
                }
            };
        }
    }

    fn finish(mut self) -> Page {
        self.flush_verb();
        if self.depth > 0 {
            self.report(
                Severity::Warning,
                self.text.len(),
                "top-level scope is never closed",
            );
        }
        self.page
    }

    fn report(&mut self, severity: Severity, at: usize, message: impl Into<String>) {
        let snippet: String = self.text[at.min(self.text.len())..].chars().take(24).collect();
        let label = if snippet.is_empty() {
            format!("in [{}] at end of definition", self.page.name)
        } else {
            format!("in [{}] near {snippet:?}", self.page.name)
        };
        let diagnostic = match severity {
            Severity::Error => Diagnostic::error(self.origin.clone(), message),
            Severity::Warning => Diagnostic::warning(self.origin.clone(), message),
        };
        self.diagnostics.push(diagnostic.with_label(label));
    }

    /// Position of the next statement-starting character after `from`.
    fn statement_end(&self, from: usize) -> usize {
        tokenizer::find_first_of(self.text, from, STATEMENT_STARTS).unwrap_or(self.text.len())
    }

    /// The innermost open scope of the current verb.
    fn current_scope(&self) -> Option<BlockId> {
        self.verb.as_ref()?;
        self.scopes.last().map(|s| s.block)
    }

    fn validate(&mut self, expression: &str, at: usize) {
        let (_, errors) = parser::parse_chain(expression);
        for error in errors {
            self.report(
                Severity::Error,
                at,
                format!("invalid expression {expression}: {}", error.message),
            );
        }
    }

    fn add_child(&mut self, parent: BlockId, block: Block, at: usize) -> Option<BlockId> {
        match self.page.add_child(parent, block) {
            Ok(id) => Some(id),
            Err(e) => {
                self.report(Severity::Error, at, e.to_string());
                None
            }
        }
    }

    fn pop_scope(&mut self) {
        let Some(scope) = self.scopes.pop() else {
            return;
        };
        let childless = self
            .page
            .block(scope.block)
            .is_some_and(|b| !b.has_children());
        if childless {
            let at = self.text.len();
            self.report(Severity::Warning, at, "condition has no body");
        }
    }

    fn close_implied(&mut self) {
        while self.scopes.len() > 1 && self.scopes.last().is_some_and(|s| s.implied) {
            self.pop_scope();
        }
    }

    fn flush_verb(&mut self) {
        self.close_implied();
        if self.scopes.len() > 1 {
            let at = self.text.len();
            self.report(Severity::Warning, at, "scope opened with `{` is never closed");
        }
        self.scopes.clear();

        let Some(open) = self.verb.take() else {
            return;
        };
        let Some(visual_name) = open.names.first().cloned() else {
            return;
        };
        let verb = Verb {
            visual_name,
            names: open.names,
            root: open.root,
        };
        tracing::debug!(noun = %self.page.name, verb = %verb.visual_name, "verb parsed");
        if let Err(e) = self.page.add_verb(verb) {
            let at = self.text.len();
            self.report(Severity::Error, at, e.to_string());
        }
    }

    fn text_block(&mut self, start: usize) -> usize {
        let Some(end) = tokenizer::find_token_end(self.text, start, TEXT_BLOCK) else {
            self.report(Severity::Error, start, "unterminated text block");
            return self.text.len();
        };
        let content = tokenizer::unescape(&self.text[start + 1..end - 1]);
        match self.current_scope() {
            Some(parent) => {
                self.add_child(parent, Block::text(content), start);
            }
            None => self.report(Severity::Error, start, "text outside of any verb"),
        }
        end
    }

    fn instruction(&mut self, start: usize) -> usize {
        let end = self.statement_end(start + 1);
        let expression = parser::chain_text(INSTRUCTION, &self.text[start + 1..end]);
        self.validate(&expression, start);
        match self.current_scope() {
            Some(parent) => {
                self.add_child(parent, Block::executable(expression), start);
            }
            None => self.report(Severity::Error, start, "instruction outside of any verb"),
        }
        end
    }

    fn condition(&mut self, start: usize) -> usize {
        let end = self.statement_end(start + 1);
        let expression = parser::chain_text(CONDITION, &self.text[start + 1..end]);
        self.validate(&expression, start);

        let explicit = self.text[end..].starts_with(BLOCK_OPEN);
        let after = if explicit { end + 1 } else { end };

        self.close_implied();
        let top_level = self.verb.is_none()
            || (self.scopes.len() == 1 && self.text[after..].starts_with(VERB_OPEN));

        if top_level {
            self.flush_verb();
            let depth = self.depth;
            self.pending.retain(|p| p.explicit || p.depth != depth);
            self.pending.push(Pending {
                expression,
                depth,
                explicit,
            });
            if explicit {
                self.depth += 1;
            }
        } else if let Some(parent) = self.current_scope()
            && let Some(block) = self.add_child(parent, Block::executable(expression), start)
        {
            self.scopes.push(Scope {
                block,
                implied: !explicit,
            });
        }
        after
    }

    fn verb_declaration(&mut self, start: usize) -> usize {
        if !self.text[start..].starts_with(VERB_OPEN) {
            self.report(
                Severity::Error,
                start,
                format!("expected verb declaration `{BRACKET_OPEN}{SCOPE}name]`"),
            );
            return tokenizer::find_token_end(self.text, start, BRACKET)
                .unwrap_or_else(|| self.statement_end(start + 1));
        }

        let mut names = Vec::new();
        let mut pos = start;
        while self.text[pos..].starts_with(VERB_OPEN) {
            let Some(end) = tokenizer::find_token_end(self.text, pos, BRACKET) else {
                self.report(Severity::Error, pos, "unmatched `[` in verb declaration");
                return self.text.len();
            };
            let name = tokenizer::unescape(self.text[pos + VERB_OPEN.len()..end - 1].trim());
            if name.is_empty() {
                self.report(Severity::Error, pos, "verb declaration without a name");
            } else {
                names.push(name);
            }
            pos = end;
        }

        self.flush_verb();
        if names.is_empty() {
            return pos;
        }

        let guard = parser::fold_chains(self.pending.iter().map(|p| p.expression.as_str()));
        let root = self.page.add_block(Block::executable(guard));
        self.verb = Some(OpenVerb { names, root });
        self.scopes = vec![Scope {
            block: root,
            implied: false,
        }];
        pos
    }

    fn close_scope(&mut self, start: usize) -> usize {
        let mut next = start + 1;
        let opens_else = self.text[next..].starts_with(BLOCK_OPEN);

        self.close_implied();
        if self.scopes.len() > 1 {
            self.pop_scope();
            if opens_else
                && let Some(parent) = self.current_scope()
                && let Some(block) = self.add_child(parent, Block::else_scope(), start)
            {
                self.scopes.push(Scope {
                    block,
                    implied: false,
                });
                next += 1;
            }
        } else if self.depth > 0 {
            self.flush_verb();
            while let Some(p) = self.pending.pop() {
                if p.explicit && p.depth + 1 == self.depth {
                    break;
                }
            }
            self.depth -= 1;
        } else {
            self.report(Severity::Error, start, "unmatched `}`");
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::clean_whitespace;

    fn parse(source: &str) -> (Page, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let body = clean_whitespace(source);
        let page = parse_page(Page::new("apple"), &body, 0..0, &mut diagnostics);
        (page, diagnostics)
    }

    fn children(page: &Page, id: BlockId) -> Vec<&Block> {
        page.block(id)
            .unwrap()
            .children
            .iter()
            .map(|c| page.block(*c).unwrap())
            .collect()
    }

    fn root_of<'p>(page: &'p Page, verb: &str) -> &'p Block {
        page.block(page.find_verb(verb).unwrap().root).unwrap()
    }

    #[test]
    fn apple_eat_tree() {
        let (page, diags) = parse(r#"[:eat]?apple=red{"You eat the red apple."}"#);
        assert!(diags.is_empty(), "{:?}", diags.as_slice());
        let verb = page.find_verb("eat").unwrap();
        let root = page.block(verb.root).unwrap();
        assert_eq!(root.expression, "");
        assert!(root.execute);

        let level1 = children(&page, verb.root);
        assert_eq!(level1.len(), 1);
        assert_eq!(level1[0].expression, "[?apple=red]");
        let level2 = children(&page, root.children[0]);
        assert_eq!(level2[0].expression, "You eat the red apple.");
        assert!(!level2[0].execute);
    }

    #[test]
    fn verb_aliases() {
        let (page, _) = parse(r#"[:take][:grab]"Taken.""#);
        let verb = page.find_verb("grab").unwrap();
        assert_eq!(verb.visual_name, "take");
        assert_eq!(verb.names, vec!["take", "grab"]);
    }

    #[test]
    fn implied_scope_closes_at_next_condition() {
        let (page, diags) = parse(r#"[:look]?a"x"?b"y"!z+=#1"#);
        assert!(diags.is_empty(), "{:?}", diags.as_slice());
        let verb = page.find_verb("look").unwrap();
        let top = children(&page, verb.root);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].children.len(), 1);
        assert_eq!(top[1].children.len(), 2);
    }

    #[test]
    fn explicit_scopes_nest() {
        let (page, diags) = parse(r#"[:look]?a{?b{"in"}"out"}"after""#);
        assert!(diags.is_empty(), "{:?}", diags.as_slice());
        let verb = page.find_verb("look").unwrap();
        let top = children(&page, verb.root);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].children.len(), 2);
        assert_eq!(top[1].expression, "after");
    }

    #[test]
    fn chained_condition_text() {
        let (page, _) = parse(r#"[:open]?door=closed&key|crowbar{"Opened."}"#);
        let verb = page.find_verb("open").unwrap();
        let top = children(&page, verb.root);
        assert_eq!(top[0].expression, "[?door=closed]&[?key]|[?crowbar]");
    }

    #[test]
    fn else_sibling() {
        let (page, diags) = parse(r#"[:eat]?apple=red{"Yum."}{"Not ripe."}"#);
        assert!(diags.is_empty(), "{:?}", diags.as_slice());
        let verb = page.find_verb("eat").unwrap();
        let top = children(&page, verb.root);
        assert_eq!(top.len(), 2);
        assert!(top[1].is_else);
        assert_eq!(top[1].children.len(), 1);
    }

    #[test]
    fn pending_conditions_guard_following_verbs() {
        let (page, diags) = parse(r#"?lamp=lit [:read]"Words." [:sleep]"Zzz.""#);
        assert!(diags.is_empty(), "{:?}", diags.as_slice());
        assert_eq!(root_of(&page, "read").expression, "[?lamp=lit]");
        assert_eq!(root_of(&page, "sleep").expression, "[?lamp=lit]");
    }

    #[test]
    fn implied_pending_replaced_at_same_level() {
        let (page, _) = parse(r#"?a[:x]"1"?b[:y]"2""#);
        assert_eq!(root_of(&page, "x").expression, "[?a]");
        assert_eq!(root_of(&page, "y").expression, "[?b]");
    }

    #[test]
    fn explicit_pending_folds_and_ends() {
        let (page, diags) = parse(r#"?a{?b[:x]"1"}[:y]"2""#);
        assert!(diags.is_empty(), "{:?}", diags.as_slice());
        assert_eq!(root_of(&page, "x").expression, "[?a]&[?b]");
        assert_eq!(root_of(&page, "y").expression, "");
    }

    #[test]
    fn break_instruction_is_childless() {
        let (page, _) = parse(r#"[:go]?a{!<<}"#);
        let verb = page.find_verb("go").unwrap();
        let top = children(&page, verb.root);
        let inner = children(&page, page.block(verb.root).unwrap().children[0]);
        assert_eq!(top[0].expression, "[?a]");
        assert_eq!(inner[0].expression, "[!<<]");
        assert!(inner[0].children.is_empty());
    }

    #[test]
    fn authoring_errors_are_reported_and_parsing_continues() {
        let (page, diags) = parse(r#""stray" } % [:ok]"fine""#);
        let messages: Vec<_> = diags.iter().map(|d| d.message.clone()).collect();
        assert!(messages.iter().any(|m| m.contains("text outside")));
        assert!(messages.iter().any(|m| m.contains("unmatched `}`")));
        assert!(messages.iter().any(|m| m.contains("unexpected character")));
        assert!(page.find_verb("ok").is_some());
    }

    #[test]
    fn unterminated_text_is_reported() {
        let (_, diags) = parse(r#"[:x]"open"#);
        assert!(diags.has_errors());
    }

    #[test]
    fn duplicate_verb_is_reported() {
        let (page, diags) = parse(r#"[:x]"1"[:x]"2""#);
        assert_eq!(page.verbs().len(), 1);
        assert!(diags.iter().any(|d| d.message.contains("already declared")));
    }

    #[test]
    fn childless_condition_warns() {
        let (_, diags) = parse(r#"[:x]?a?b"t""#);
        assert!(diags.iter().any(|d| d.message == "condition has no body"));
        assert!(!diags.has_errors());
    }
}
