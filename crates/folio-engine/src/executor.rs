//! Walking a verb's block tree.

use folio_core::{BlockId, Page};

use crate::context::Context;

impl<'a> Context<'a> {
    /// Run `verb` on `noun`'s page. Returns whether its guard held.
    ///
    /// Unknown pages and verbs are reported and read as not run. Calls
    /// nested deeper than the configured limit are refused.
    pub(crate) fn run_verb(&mut self, noun: &str, verb: &str) -> bool {
        let story = self.story;
        let Some(page) = story.lookup(noun, &mut self.diagnostics) else {
            return false;
        };
        let Some(found) = page.find_verb(verb) else {
            self.error(noun, format!("verb not found: [{noun}:{verb}]"));
            return false;
        };
        if self.depth >= self.config.max_depth {
            self.error(
                noun,
                format!(
                    "[{noun}:{verb}] nested deeper than {} calls, not run",
                    self.config.max_depth
                ),
            );
            return false;
        }

        self.depth += 1;
        let ran = self.run_root(page, found.root);
        self.depth -= 1;
        tracing::debug!(noun, verb, ran, depth = self.depth, "verb run");
        ran
    }

    /// Whether the root guard of a verb holds, without running its body.
    pub(crate) fn verb_available(&mut self, page: &'a Page, root: BlockId) -> bool {
        let Some(block) = page.block(root) else {
            return false;
        };
        self.eval_expression(&page.name, &block.expression).holds
    }

    fn run_root(&mut self, page: &'a Page, root: BlockId) -> bool {
        if !self.verb_available(page, root) {
            return false;
        }
        if let Some(block) = page.block(root) {
            // unwinding past the root just ends the verb
            self.run_children(page, &block.children);
        }
        true
    }

    /// Execute one block. Returns whether it ran and how many more scopes
    /// to unwind.
    pub(crate) fn run_block(&mut self, page: &'a Page, id: BlockId) -> (bool, usize) {
        let Some(block) = page.block(id) else {
            return (false, 0);
        };
        let noun = page.name.as_str();

        if !block.execute || !block.is_bracketed() {
            self.output.push_str(&block.expression);
            return (true, 0);
        }

        let chain = self.parse(noun, &block.expression);
        if !block.has_children() {
            if chain.is_condition() {
                self.warning(noun, format!("condition {} has no body", block.expression));
                return (false, 0);
            }
            let verdict = self.eval_chain(noun, &chain);
            return (verdict.holds, verdict.breaks);
        }

        if !self.eval_chain(noun, &chain).holds {
            return (false, 0);
        }
        (true, self.run_children(page, &block.children))
    }

    /// Execute children in order. A child asking to unwind `n > 0` scopes
    /// stops its siblings and hands `n - 1` to the caller.
    fn run_children(&mut self, page: &'a Page, children: &[BlockId]) -> usize {
        // whether the current condition/else run has executed a branch
        let mut branch: Option<bool> = None;

        for &id in children {
            let Some(block) = page.block(id) else {
                continue;
            };
            let (ran, breaks) = if block.is_else {
                match branch {
                    Some(false) => (true, self.run_children(page, &block.children)),
                    Some(true) => (false, 0),
                    None => {
                        self.warning(&page.name, "else scope without a preceding condition");
                        (false, 0)
                    }
                }
            } else {
                self.run_block(page, id)
            };

            branch = if block.is_else {
                branch.map(|done| done || ran)
            } else if block.execute && block.has_children() {
                Some(ran)
            } else {
                None
            };

            if breaks > 0 {
                return breaks - 1;
            }
        }
        0
    }
}
