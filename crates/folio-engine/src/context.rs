//! State borrowed for the duration of one engine call.

use folio_core::Properties;
use folio_dsl::{Diagnostic, Diagnostics, Story};
use folio_session::Session;

use crate::book::Book;
use crate::config::EngineConfig;

/// An evaluated expression: a value plus whether it reads as a number.
///
/// The hint is set by `#` operands and spreads through arithmetic; it picks
/// integer rather than count semantics in ordered comparisons.
#[derive(Debug, Clone, Default)]
pub(crate) struct Value {
    pub(crate) props: Properties,
    pub(crate) numeric: bool,
}

impl Value {
    pub(crate) fn text(props: Properties) -> Self {
        Self {
            props,
            numeric: false,
        }
    }

    pub(crate) fn number(n: i64) -> Self {
        Self {
            props: Properties::from_integer(n),
            numeric: true,
        }
    }

    /// An expression holds when its count is positive.
    pub(crate) fn holds(&self) -> bool {
        self.props.count() > 0
    }
}

pub(crate) struct Context<'a> {
    pub(crate) story: &'a Story,
    pub(crate) session: &'a mut Session,
    pub(crate) book: &'a mut dyn Book,
    pub(crate) config: &'a EngineConfig,
    pub(crate) diagnostics: Diagnostics,
    pub(crate) output: String,
    pub(crate) depth: usize,
    /// Bookmark requested while an action is under way, with its description.
    pub(crate) deferred_bookmark: Option<Option<String>>,
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        story: &'a Story,
        session: &'a mut Session,
        book: &'a mut dyn Book,
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            story,
            session,
            book,
            config,
            diagnostics: Diagnostics::new(),
            output: String::new(),
            depth: 0,
            deferred_bookmark: None,
        }
    }

    pub(crate) fn error(&mut self, noun: &str, message: impl Into<String>) {
        self.diagnostics
            .push(Diagnostic::error(0..0, message).with_label(format!("in [{noun}]")));
    }

    pub(crate) fn warning(&mut self, noun: &str, message: impl Into<String>) {
        self.diagnostics
            .push(Diagnostic::warning(0..0, message).with_label(format!("in [{noun}]")));
    }

    /// Authored default of a noun; empty for nouns without a page.
    pub(crate) fn default_of(&self, noun: &str) -> Properties {
        self.story
            .find_page(noun)
            .map(|page| page.defaults.clone())
            .unwrap_or_default()
    }

    /// Current value of a noun: the session override, else the authored
    /// default. A noun known to neither is reported and reads as empty.
    pub(crate) fn value_of(&mut self, noun: &str) -> Properties {
        if let Some(value) = self.session.value(noun) {
            return value.clone();
        }
        self.story
            .lookup(noun, &mut self.diagnostics)
            .map(|page| page.defaults.clone())
            .unwrap_or_default()
    }

    /// Mutable override of a noun's value, copied from its default on first touch.
    pub(crate) fn value_mut(&mut self, noun: &str) -> &mut Properties {
        let default = self.default_of(noun);
        self.session.value_mut(noun, &default)
    }
}
