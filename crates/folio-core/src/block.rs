use std::fmt;

use serde::{Deserialize, Serialize};

/// Opening marker of an executable expression (`[?...]`, `[!...]`).
pub const EXPRESSION_OPEN: char = '[';

/// Stable index of a block inside its page's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockId(pub usize);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One node of a parsed verb body.
///
/// Literal text blocks are never executed; executable blocks hold a bracketed
/// expression chain such as `[?apple=red]&[?knife]` or `[!apple-=red]`.
/// A block with children is a condition scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Expression text, or the literal text to print.
    pub expression: String,
    /// Whether the expression is a condition/instruction rather than text.
    pub execute: bool,
    /// Runs only when the preceding sibling condition did not.
    pub is_else: bool,
    /// Child blocks in declaration order.
    pub children: Vec<BlockId>,
}

impl Block {
    /// A literal text block.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            expression: text.into(),
            ..Self::default()
        }
    }

    /// An executable block holding a bracketed expression chain.
    pub fn executable(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            execute: true,
            ..Self::default()
        }
    }

    /// An else scope; it carries no expression of its own.
    pub fn else_scope() -> Self {
        Self {
            execute: true,
            is_else: true,
            ..Self::default()
        }
    }

    /// Whether the expression begins with the expression-open marker.
    pub fn is_bracketed(&self) -> bool {
        self.expression.starts_with(EXPRESSION_OPEN)
    }

    /// Whether this block opens a condition scope.
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_blocks_are_inert() {
        let b = Block::text("Hello.");
        assert!(!b.execute);
        assert!(!b.is_bracketed());
    }

    #[test]
    fn executable_blocks_are_bracketed() {
        let b = Block::executable("[!apple+=red]");
        assert!(b.execute);
        assert!(b.is_bracketed());
        assert!(!b.has_children());
    }

    #[test]
    fn block_id_display() {
        assert_eq!(BlockId(3).to_string(), "#3");
    }
}
