use serde::{Deserialize, Serialize};

use crate::block::{Block, BlockId};
use crate::error::{CoreError, CoreResult};
use crate::properties::Properties;

/// A player action declared on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verb {
    /// Name shown in the choice menu (the first declared alias).
    pub visual_name: String,
    /// Every alias the verb answers to, including the visual name.
    pub names: Vec<String>,
    /// Root block; its expression holds the folded top-level conditions.
    pub root: BlockId,
}

impl Verb {
    /// Whether the verb answers to `name` (ASCII case-insensitive).
    pub fn answers_to(&self, name: &str) -> bool {
        self.names.iter().any(|n| n.eq_ignore_ascii_case(name))
    }
}

/// The parsed definition of one noun.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Page {
    /// Noun name.
    pub name: String,
    /// Authored default value, used while the session holds no override.
    pub defaults: Properties,
    /// Normalized source text the page was parsed from.
    pub source: String,
    verbs: Vec<Verb>,
    blocks: Vec<Block>,
}

impl Page {
    /// Create an empty page.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the authored default value.
    pub fn with_defaults(mut self, defaults: Properties) -> Self {
        self.defaults = defaults;
        self
    }

    /// Append a block to the arena, returning its id.
    pub fn add_block(&mut self, block: Block) -> BlockId {
        self.blocks.push(block);
        BlockId(self.blocks.len() - 1)
    }

    /// Append `child` to the children of `parent`.
    pub fn add_child(&mut self, parent: BlockId, child: Block) -> CoreResult<BlockId> {
        if parent.0 >= self.blocks.len() {
            return Err(CoreError::BlockNotFound(parent));
        }
        let id = self.add_block(child);
        self.blocks[parent.0].children.push(id);
        Ok(id)
    }

    /// Look up a block by id.
    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.0)
    }

    /// Mutable access to a block by id.
    pub fn block_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.blocks.get_mut(id.0)
    }

    /// Number of blocks in the arena.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Register a verb. Fails if one of its names is already taken.
    pub fn add_verb(&mut self, verb: Verb) -> CoreResult<()> {
        if let Some(taken) = verb.names.iter().find(|n| self.find_verb(n).is_some()) {
            return Err(CoreError::DuplicateVerb(taken.clone()));
        }
        self.verbs.push(verb);
        Ok(())
    }

    /// Verbs in declaration order.
    pub fn verbs(&self) -> &[Verb] {
        &self.verbs
    }

    /// Find a verb by any of its names.
    pub fn find_verb(&self, name: &str) -> Option<&Verb> {
        self.verbs.iter().find(|v| v.answers_to(name))
    }
}

/// A reusable verb template, expanded into pages at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    /// Name pages use to reference the pattern.
    pub name: String,
    /// Text in the template that stands for the noun.
    pub placeholder: String,
    /// Raw template text.
    pub template: String,
}

impl Pattern {
    /// Create a pattern.
    pub fn new(
        name: impl Into<String>,
        placeholder: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            placeholder: placeholder.into(),
            template: template.into(),
        }
    }

    /// The template with every occurrence of the placeholder replaced by `noun`.
    pub fn expand(&self, noun: &str) -> String {
        if self.placeholder.is_empty() {
            return self.template.clone();
        }
        self.template.replace(&self.placeholder, noun)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_with_verb() -> Page {
        let mut page = Page::new("apple");
        let root = page.add_block(Block::executable(""));
        page.add_verb(Verb {
            visual_name: "eat".to_string(),
            names: vec!["eat".to_string(), "bite".to_string()],
            root,
        })
        .unwrap();
        page
    }

    #[test]
    fn find_verb_by_alias() {
        let page = page_with_verb();
        assert_eq!(page.find_verb("bite").unwrap().visual_name, "eat");
        assert_eq!(page.find_verb("EAT").unwrap().visual_name, "eat");
        assert!(page.find_verb("throw").is_none());
    }

    #[test]
    fn duplicate_verb_rejected() {
        let mut page = page_with_verb();
        let root = page.add_block(Block::default());
        let err = page
            .add_verb(Verb {
                visual_name: "bite".to_string(),
                names: vec!["bite".to_string()],
                root,
            })
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateVerb(n) if n == "bite"));
    }

    #[test]
    fn children_are_recorded_in_order() {
        let mut page = Page::new("door");
        let root = page.add_block(Block::executable(""));
        let a = page.add_child(root, Block::text("a")).unwrap();
        let b = page.add_child(root, Block::text("b")).unwrap();
        assert_eq!(page.block(root).unwrap().children, vec![a, b]);
        assert!(page.add_child(BlockId(99), Block::text("c")).is_err());
    }

    #[test]
    fn pattern_expansion_replaces_every_occurrence() {
        let pattern = Pattern::new("foo", "door", "\"A @door. The door opens.\"");
        assert_eq!(pattern.expand("north"), "\"A @north. The north opens.\"");
    }
}
