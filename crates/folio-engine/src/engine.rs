//! The host-facing entry points: list verbs, read a verb, take an action.

use std::path::Path;

use folio_core::{BlockId, Properties};
use folio_dsl::{Diagnostic, Story};
use folio_session::Session;
use serde::Serialize;

use crate::book::Book;
use crate::config::EngineConfig;
use crate::context::Context;
use crate::error::{EngineError, EngineResult};

/// Text produced by running a verb, plus what went wrong along the way.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Reading {
    /// Literal text appended by the blocks that ran.
    pub text: String,
    /// Whether the verb's guard (or the evaluated expression) held.
    pub ran: bool,
    /// Runtime diagnostics, in the order they occurred.
    pub diagnostics: Vec<Diagnostic>,
}

/// A story being played: the parsed story, the session, and configuration.
#[derive(Debug, Clone)]
pub struct Engine {
    story: Story,
    session: Session,
    config: EngineConfig,
}

impl Engine {
    /// Start a fresh play-through of `story`.
    pub fn new(story: Story, config: EngineConfig) -> Self {
        Self {
            story,
            session: Session::default(),
            config,
        }
    }

    /// Continue an existing play-through.
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    /// The parsed story.
    pub fn story(&self) -> &Story {
        &self.story
    }

    /// The play-through state.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Mutable play-through state, for undo/redo and bookmarks.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Give up the engine, keeping the session.
    pub fn into_session(self) -> Session {
        self.session
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current value of a noun: the session override, else the authored
    /// default. `None` for a noun known to neither.
    pub fn value(&self, noun: &str) -> Option<Properties> {
        self.session
            .value(noun)
            .or_else(|| self.story.find_page(noun).map(|page| &page.defaults))
            .cloned()
    }

    fn context<'a>(&'a mut self, book: &'a mut dyn Book) -> Context<'a> {
        Context::new(&self.story, &mut self.session, book, &self.config)
    }

    fn check_verb(&self, noun: &str, verb: &str) -> EngineResult<()> {
        let page = self
            .story
            .find_page(noun)
            .ok_or_else(|| EngineError::PageNotFound(noun.to_string()))?;
        if page.find_verb(verb).is_none() {
            return Err(EngineError::VerbNotFound {
                noun: noun.to_string(),
                verb: verb.to_string(),
            });
        }
        Ok(())
    }

    /// Visual names of the verbs on `noun` whose guards currently hold, in
    /// declaration order. This is the player's choice menu.
    pub fn get_verbs(&mut self, noun: &str, book: &mut dyn Book) -> EngineResult<Vec<String>> {
        let story = &self.story;
        let page = story
            .find_page(noun)
            .ok_or_else(|| EngineError::PageNotFound(noun.to_string()))?;
        let mut ctx = Context::new(story, &mut self.session, book, &self.config);
        let verbs = page
            .verbs()
            .iter()
            .filter(|verb| ctx.verb_available(page, verb.root))
            .map(|verb| verb.visual_name.clone())
            .collect();
        Ok(verbs)
    }

    /// Run one verb and return its text. The session changes but no
    /// snapshot is taken.
    pub fn read(&mut self, noun: &str, verb: &str, book: &mut dyn Book) -> EngineResult<Reading> {
        self.check_verb(noun, verb)?;
        let mut ctx = self.context(book);
        let ran = ctx.run_verb(noun, verb);
        let (output, diagnostics) = (ctx.output, ctx.diagnostics);
        Ok(self.reading(output, diagnostics.into_vec(), ran))
    }

    /// Take a player action: drop any undone future, run the verb, and
    /// record a snapshot.
    ///
    /// A verb that moves through history itself (`LoadSnapshot`,
    /// `LoadSession`, `NewSession`) records no snapshot: the jump is the
    /// action's effect. Bookmarks the verb asked for land on its snapshot.
    pub fn act(&mut self, noun: &str, verb: &str, book: &mut dyn Book) -> EngineResult<Reading> {
        self.check_verb(noun, verb)?;
        self.session.trim();
        self.session.set_action(noun, verb);

        let mut ctx = self.context(book);
        let ran = ctx.run_verb(noun, verb);
        let (output, diagnostics, bookmark) = (ctx.output, ctx.diagnostics, ctx.deferred_bookmark);
        let reading = self.reading(output, diagnostics.into_vec(), ran);

        if self.session.pending_action().is_none() {
            let snapshot = self.session.current_snapshot();
            tracing::info!(noun, verb, snapshot, "action moved through history");
            return Ok(reading);
        }
        let snapshot = self.session.create_snapshot();
        if let Some(description) = bookmark {
            self.session.add_bookmark(description.as_deref());
        }
        tracing::info!(noun, verb, snapshot, ran = reading.ran, "action taken");
        Ok(reading)
    }

    /// Evaluate a block expression such as `[?apple=red]&[!basket+=apple]`
    /// in the scope of `noun`.
    pub fn evaluate(&mut self, noun: &str, expression: &str, book: &mut dyn Book) -> Reading {
        let mut ctx = self.context(book);
        let holds = ctx.eval_expression(noun, expression).holds;
        let (output, diagnostics) = (ctx.output, ctx.diagnostics);
        self.reading(output, diagnostics.into_vec(), holds)
    }

    /// Execute one block of `noun`'s page. Returns the number of scopes
    /// the block asks its caller to unwind.
    pub fn execute_block(
        &mut self,
        noun: &str,
        block: BlockId,
        book: &mut dyn Book,
    ) -> EngineResult<(usize, Reading)> {
        let story = &self.story;
        let page = story
            .find_page(noun)
            .ok_or_else(|| EngineError::PageNotFound(noun.to_string()))?;
        let mut ctx = Context::new(story, &mut self.session, book, &self.config);
        let (ran, breaks) = ctx.run_block(page, block);
        let (output, diagnostics) = (ctx.output, ctx.diagnostics);
        Ok((breaks, self.reading(output, diagnostics.into_vec(), ran)))
    }

    fn reading(&self, mut text: String, diagnostics: Vec<Diagnostic>, ran: bool) -> Reading {
        if self.config.echo_diagnostics {
            for d in &diagnostics {
                text.push_str(&format!("\n[{d}]"));
            }
        }
        Reading {
            text,
            ran,
            diagnostics,
        }
    }

    /// Write the session to a file.
    pub fn save_session(&self, path: &Path) -> EngineResult<()> {
        self.session.save(path)?;
        Ok(())
    }

    /// Replace the session with one read from a file.
    pub fn load_session(&mut self, path: &Path) -> EngineResult<()> {
        self.session = Session::load(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::NullBook;

    fn engine(source: &str) -> Engine {
        let loaded = folio_dsl::load_story(source);
        assert!(!loaded.has_errors(), "{:?}", loaded.diagnostics);
        Engine::new(loaded.story, EngineConfig::default())
    }

    fn read(engine: &mut Engine, noun: &str, verb: &str) -> String {
        engine.read(noun, verb, &mut NullBook).unwrap().text
    }

    const NESTED: &str = r#"[box][:open]?{"a"?{"b"?{"c"!<<<"x"}"y"}"z"}"after""#;

    #[test]
    fn eating_the_apple() {
        let mut e = engine(r#"[apple=red,green][:eat]?apple=red{"You eat the red apple."}"#);
        assert_eq!(read(&mut e, "apple", "eat"), "You eat the red apple.");
    }

    #[test]
    fn non_ascii_text_is_read_back() {
        let mut e = engine("[apple=rouge]\n// goûter\n[:eat]?apple=rouge{\"Café au lait.\"}");
        assert_eq!(read(&mut e, "apple", "eat"), "Café au lait.");
    }

    #[test]
    fn break_unwinds_exactly_its_count() {
        let mut e = engine(NESTED);
        assert_eq!(read(&mut e, "box", "open"), "abcafter");

        let mut e = engine(&NESTED.replace("<<<", "<<"));
        assert_eq!(read(&mut e, "box", "open"), "abczafter");

        let mut e = engine(&NESTED.replace("<<<", "<"));
        assert_eq!(read(&mut e, "box", "open"), "abcyzafter");
    }

    #[test]
    fn execute_block_reports_breaks() {
        let mut e = engine(NESTED);
        let page = e.story().find_page("box").unwrap();
        let id = (0..page.block_count())
            .map(BlockId)
            .find(|&id| page.block(id).unwrap().expression == "[!<<<]")
            .unwrap();
        let (breaks, reading) = e.execute_block("box", id, &mut NullBook).unwrap();
        assert_eq!(breaks, 3);
        assert!(reading.ran);
    }

    #[test]
    fn else_runs_when_condition_fails() {
        let mut e = engine(r#"[lamp=off][:use]?lamp=on{"It glows."}{"It is dark."}"#);
        assert_eq!(read(&mut e, "lamp", "use"), "It is dark.");
        e.evaluate("lamp", "[!lamp=on]", &mut NullBook);
        assert_eq!(read(&mut e, "lamp", "use"), "It glows.");
    }

    #[test]
    fn verb_guards_build_the_menu() {
        let mut e = engine(
            r#"[door=locked]?door=locked[:knock]"Nobody answers."?door=open[:enter][:go in]"You step in.""#,
        );
        assert_eq!(e.get_verbs("door", &mut NullBook).unwrap(), ["knock"]);
        e.evaluate("door", "[!=open]", &mut NullBook);
        assert_eq!(e.get_verbs("door", &mut NullBook).unwrap(), ["enter"]);
        assert_eq!(read(&mut e, "door", "go in"), "You step in.");
    }

    #[test]
    fn actions_snapshot_and_undo() {
        let mut e = engine(
            r#"[apple=red,green]?apple=red[:eat]"Crunch."!apple-=red!apple+=bitten"#,
        );
        let reading = e.act("apple", "eat", &mut NullBook).unwrap();
        assert_eq!(reading.text, "Crunch.");
        assert_eq!(e.value("apple").unwrap().print_values(), "green,bitten,#0");
        assert!(e.get_verbs("apple", &mut NullBook).unwrap().is_empty());
        assert_eq!(e.session().snapshot_action(1), Some("apple:eat"));

        assert!(e.session_mut().undo_snapshot());
        assert_eq!(e.value("apple").unwrap().print_values(), "red,green,#0");
        assert_eq!(e.get_verbs("apple", &mut NullBook).unwrap(), ["eat"]);
    }

    #[test]
    fn acting_mid_undo_branches() {
        let mut e = engine(r#"[n=#0][:up]!n+=#1[:down]!n-=#1"#);
        e.act("n", "up", &mut NullBook).unwrap();
        e.act("n", "up", &mut NullBook).unwrap();
        e.session_mut().undo_snapshot();
        e.act("n", "down", &mut NullBook).unwrap();

        assert_eq!(e.value("n").unwrap().integer(), 0);
        assert_eq!(e.session().snapshots().len(), 3);
        assert!(!e.session_mut().redo_snapshot());
        assert_eq!(e.session().history().queue(), ["n:up", "n:down"]);
    }

    #[test]
    fn loading_a_snapshot_is_the_action() {
        let mut e = engine(r#"[n=#0][:up]!n+=#1[:back]!LoadSnapshot(#1)"#);
        e.act("n", "up", &mut NullBook).unwrap();
        e.act("n", "up", &mut NullBook).unwrap();
        e.act("n", "back", &mut NullBook).unwrap();

        assert_eq!(e.session().current_snapshot(), 1);
        assert_eq!(e.session().snapshots().len(), 3);
        assert_eq!(e.value("n").unwrap().integer(), 1);
        assert_eq!(e.session().history().queue(), ["n:up", "n:up"]);

        // the live state is the state of the snapshot it claims
        assert!(e.session_mut().load_snapshot(1));
        assert_eq!(e.value("n").unwrap().integer(), 1);

        e.act("n", "up", &mut NullBook).unwrap();
        assert_eq!(e.session().current_snapshot(), 2);
        assert_eq!(e.value("n").unwrap().integer(), 2);
        assert_eq!(e.session().snapshots().len(), 3);
    }

    #[test]
    fn bookmarks_taken_by_a_verb_land_on_its_action() {
        let mut e = engine(r#"[room][:look]"Dusty."[:rest]!UserBookmark(a nap)"#);
        e.act("room", "look", &mut NullBook).unwrap();
        e.act("room", "rest", &mut NullBook).unwrap();

        assert_eq!(e.session().bookmarks().len(), 1);
        assert_eq!(e.session().bookmarks()[&1], "a nap");
        assert_eq!(e.session().snapshot_for_queue(1), Some(2));
    }

    #[test]
    fn patterns_expand_into_pages() {
        let mut e = engine(r#"[room[room]][:look]"You are in <room>." [north[room]]"#);
        assert_eq!(read(&mut e, "north", "look"), "You are in <north>.");
    }

    #[test]
    fn runaway_recursion_fails_closed() {
        let loaded = folio_dsl::load_story(r#"[loop][:spin]"x"!loop:spin"#);
        let mut e = Engine::new(loaded.story, EngineConfig::default().with_max_depth(3));
        let reading = e.read("loop", "spin", &mut NullBook).unwrap();
        assert_eq!(reading.text, "xxx");
        assert!(reading.ran);
        assert!(
            reading.diagnostics[0]
                .message
                .contains("nested deeper than 3 calls")
        );
    }

    #[test]
    fn missing_page_and_verb_are_errors() {
        let mut e = engine(r#"[apple][:eat]"ok""#);
        assert!(matches!(
            e.read("pear", "eat", &mut NullBook),
            Err(EngineError::PageNotFound(_))
        ));
        assert!(matches!(
            e.read("apple", "throw", &mut NullBook),
            Err(EngineError::VerbNotFound { .. })
        ));
    }

    #[test]
    fn runtime_problems_do_not_stop_the_verb() {
        let loaded = folio_dsl::load_story(r#"[x][:go]"a"!Nope(b)"c""#);
        let mut e = Engine::new(
            loaded.story,
            EngineConfig::default().with_echo_diagnostics(true),
        );
        let reading = e.read("x", "go", &mut NullBook).unwrap();
        assert!(reading.text.starts_with("ac\n[error: unknown function: Nope"));
        assert_eq!(reading.diagnostics.len(), 1);
    }

    #[test]
    fn session_survives_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("n.session");

        let mut e = engine(r#"[n=#0][:up]!n+=#1"#);
        e.act("n", "up", &mut NullBook).unwrap();
        e.save_session(&path).unwrap();

        let mut fresh = engine(r#"[n=#0][:up]!n+=#1"#);
        fresh.load_session(&path).unwrap();
        assert_eq!(fresh.value("n").unwrap().integer(), 1);
    }
}
