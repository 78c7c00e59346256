//! Built-in functions callable from story expressions, e.g. `Size(@basket)`.
//!
//! A call receives its evaluated argument list and returns a replacement.
//! Functions touching play-through history act on the session directly;
//! those reaching the host go through [`Book`](crate::Book).

use std::fmt;

use folio_core::Properties;

use crate::context::{Context, Value};

/// The function catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    /// Number of atoms in the arguments.
    Size,
    /// Switch the named assets on.
    Play,
    /// Switch the named assets off.
    Stop,
    /// Wrap each atom in keyword markers, `<noun>`.
    Keyword,
    /// Let the player pick one atom.
    SelectValue,
    /// Append the arguments to the reading.
    Print,
    /// Close the open menu.
    CloseMenu,
    /// Open the named menu.
    OpenMenu,
    /// Close the book.
    CloseBook,
    /// Open the named book.
    OpenBook,
    /// Leave the application.
    Quit,
    /// Titles of the available books.
    GetBooks,
    /// 1 while a play-through is running.
    IsInGame,
    /// Names of stored sessions.
    GetSessions,
    /// Name of the current session.
    GetSessionName,
    /// Store the current session.
    SaveSession,
    /// Rename the session to the argument and store it as a new branch.
    BranchSession,
    /// Replace the session with a stored one.
    LoadSession,
    /// Start over, optionally under a new name.
    NewSession,
    /// Bookmark the action being taken, or the last one outside an action.
    Bookmark,
    /// Like `Bookmark`, with the arguments as description.
    UserBookmark,
    /// Jump to the snapshot given by the integer argument.
    LoadSnapshot,
    /// One `index noun:verb` atom per snapshot.
    GetSnapshots,
    /// One `queue description` atom per bookmark.
    GetBookmarks,
    /// Index of the current snapshot.
    GetSnapshotIndex,
    /// Show a message the player acknowledges.
    Dialog,
    /// Ask the player for text.
    Input,
}

impl Function {
    /// Every function, in catalog order.
    pub const ALL: [Function; 27] = [
        Function::Size,
        Function::Play,
        Function::Stop,
        Function::Keyword,
        Function::SelectValue,
        Function::Print,
        Function::CloseMenu,
        Function::OpenMenu,
        Function::CloseBook,
        Function::OpenBook,
        Function::Quit,
        Function::GetBooks,
        Function::IsInGame,
        Function::GetSessions,
        Function::GetSessionName,
        Function::SaveSession,
        Function::BranchSession,
        Function::LoadSession,
        Function::NewSession,
        Function::Bookmark,
        Function::UserBookmark,
        Function::LoadSnapshot,
        Function::GetSnapshots,
        Function::GetBookmarks,
        Function::GetSnapshotIndex,
        Function::Dialog,
        Function::Input,
    ];

    /// Name as written in stories.
    pub fn name(self) -> &'static str {
        match self {
            Function::Size => "Size",
            Function::Play => "Play",
            Function::Stop => "Stop",
            Function::Keyword => "Keyword",
            Function::SelectValue => "SelectValue",
            Function::Print => "Print",
            Function::CloseMenu => "CloseMenu",
            Function::OpenMenu => "OpenMenu",
            Function::CloseBook => "CloseBook",
            Function::OpenBook => "OpenBook",
            Function::Quit => "Quit",
            Function::GetBooks => "GetBooks",
            Function::IsInGame => "IsInGame",
            Function::GetSessions => "GetSessions",
            Function::GetSessionName => "GetSessionName",
            Function::SaveSession => "SaveSession",
            Function::BranchSession => "BranchSession",
            Function::LoadSession => "LoadSession",
            Function::NewSession => "NewSession",
            Function::Bookmark => "Bookmark",
            Function::UserBookmark => "UserBookmark",
            Function::LoadSnapshot => "LoadSnapshot",
            Function::GetSnapshots => "GetSnapshots",
            Function::GetBookmarks => "GetBookmarks",
            Function::GetSnapshotIndex => "GetSnapshotIndex",
            Function::Dialog => "Dialog",
            Function::Input => "Input",
        }
    }

    /// Find a function by its exact name.
    pub fn lookup(name: &str) -> Option<Function> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn flag(value: bool) -> Value {
    Value::number(i64::from(value))
}

fn count(n: usize) -> Value {
    Value::number(i64::try_from(n).unwrap_or(i64::MAX))
}

impl Context<'_> {
    /// Run one function over `args`, returning its result.
    pub(crate) fn call(&mut self, noun: &str, function: Function, args: Value) -> Value {
        tracing::debug!(noun, function = function.name(), "function call");
        let atoms = args.props.text_values().to_vec();
        let first = atoms.first().map(String::as_str).unwrap_or_default();

        match function {
            Function::Size => count(atoms.len()),
            Function::Play | Function::Stop => {
                let on = function == Function::Play;
                for asset in &atoms {
                    self.session.set_asset(asset, on);
                    if on {
                        self.book.play(asset);
                    } else {
                        self.book.stop(asset);
                    }
                }
                args
            }
            Function::Keyword => Value::text(Properties::from_atoms(
                atoms.iter().map(|a| format!("<{a}>")),
            )),
            Function::SelectValue => match self.book.select_value(&atoms) {
                Some(i) => match atoms.get(i) {
                    Some(choice) => Value::text(Properties::from_text(choice.clone())),
                    None => {
                        self.warning(noun, format!("selection {i} is out of range"));
                        Value::default()
                    }
                },
                None => Value::default(),
            },
            Function::Print => {
                if !args.props.is_empty() {
                    self.output.push_str(&args.props.to_string());
                }
                args
            }
            Function::OpenMenu => {
                self.book.open_menu(first);
                args
            }
            Function::CloseMenu => {
                self.book.close_menu();
                args
            }
            Function::OpenBook => flag(self.book.open_book(first)),
            Function::CloseBook => {
                self.book.close_book();
                args
            }
            Function::Quit => {
                self.book.quit();
                args
            }
            Function::GetBooks => Value::text(Properties::from_atoms(self.book.books())),
            Function::IsInGame => flag(self.book.is_in_game()),
            Function::GetSessions => Value::text(Properties::from_atoms(self.book.sessions())),
            Function::GetSessionName => Value::text(Properties::from_text(self.session.name())),
            Function::SaveSession => flag(self.book.save_session(self.session)),
            Function::BranchSession => {
                if !first.is_empty() {
                    self.session.set_name(first);
                }
                flag(self.book.save_session(self.session))
            }
            Function::LoadSession => match self.book.load_session(first) {
                Some(session) => {
                    *self.session = session;
                    tracing::info!(session = first, "session replaced");
                    flag(true)
                }
                None => flag(false),
            },
            Function::NewSession => {
                self.session.reset();
                if !first.is_empty() {
                    self.session.set_name(first);
                }
                flag(true)
            }
            Function::Bookmark | Function::UserBookmark => {
                let description = (function == Function::UserBookmark).then(|| atoms.join(" "));
                if self.session.pending_action().is_some() {
                    // the action under way gets its snapshot once the verb ends
                    let queue = self.session.history().queue().len();
                    self.deferred_bookmark = Some(description);
                    count(queue)
                } else {
                    self.session
                        .add_bookmark(description.as_deref())
                        .map_or_else(Value::default, count)
                }
            }
            Function::LoadSnapshot => {
                let loaded = usize::try_from(args.props.integer())
                    .is_ok_and(|index| self.session.load_snapshot(index));
                flag(loaded)
            }
            Function::GetSnapshots => {
                let entries = (1..self.session.snapshots().len()).map(|i| {
                    format!("{i} {}", self.session.snapshot_action(i).unwrap_or_default())
                });
                Value::text(Properties::from_atoms(entries))
            }
            Function::GetBookmarks => Value::text(Properties::from_atoms(
                self.session
                    .bookmarks()
                    .iter()
                    .map(|(queue, description)| format!("{queue} {description}")),
            )),
            Function::GetSnapshotIndex => count(self.session.current_snapshot()),
            Function::Dialog => flag(self.book.dialog(&args.props.to_string())),
            Function::Input => match self.book.input(&atoms.join(" ")) {
                Some(line) if !line.trim().is_empty() => {
                    Value::text(Properties::from_text(line.trim()))
                }
                _ => Value::default(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::Book;
    use crate::config::EngineConfig;
    use folio_dsl::Story;
    use folio_session::Session;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
        saved: Vec<String>,
        stored: Option<Session>,
    }

    impl Book for Recorder {
        fn play(&mut self, asset: &str) {
            self.events.push(format!("play {asset}"));
        }

        fn stop(&mut self, asset: &str) {
            self.events.push(format!("stop {asset}"));
        }

        fn select_value(&mut self, options: &[String]) -> Option<usize> {
            options.len().checked_sub(1)
        }

        fn open_menu(&mut self, name: &str) {
            self.events.push(format!("menu {name}"));
        }

        fn save_session(&mut self, session: &Session) -> bool {
            self.saved.push(session.name().to_string());
            true
        }

        fn load_session(&mut self, _name: &str) -> Option<Session> {
            self.stored.take()
        }

        fn input(&mut self, prompt: &str) -> Option<String> {
            Some(format!("  answer to {prompt} "))
        }
    }

    fn run(session: &mut Session, book: &mut Recorder, expression: &str) -> (bool, String) {
        let story = Story::new();
        let config = EngineConfig::default();
        let mut ctx = Context::new(&story, session, book, &config);
        let holds = ctx.eval_expression("x", expression).holds;
        (holds, ctx.output)
    }

    #[test]
    fn catalog_names_round_trip() {
        assert_eq!(Function::ALL.len(), 27);
        for f in Function::ALL {
            assert_eq!(Function::lookup(f.name()), Some(f));
        }
        assert_eq!(Function::lookup("size"), None);
    }

    #[test]
    fn play_and_stop_track_assets() {
        let mut session = Session::default();
        let mut book = Recorder::default();
        run(&mut session, &mut book, "[!Play(rain,wind)]");
        assert_eq!(session.active_assets(), ["rain", "wind"]);
        run(&mut session, &mut book, "[!Stop(rain)]");
        assert_eq!(session.active_assets(), ["wind"]);
        assert_eq!(book.events, ["play rain", "play wind", "stop rain"]);
    }

    #[test]
    fn size_and_print() {
        let mut session = Session::default();
        let mut book = Recorder::default();
        let (holds, out) = run(&mut session, &mut book, "[?Print(Size(a,b,c))]");
        assert!(holds);
        assert_eq!(out, "3");
    }

    #[test]
    fn keyword_and_select() {
        let mut session = Session::default();
        let mut book = Recorder::default();
        let (_, out) = run(&mut session, &mut book, "[!Print(Keyword(door,key))]");
        assert_eq!(out, "<door>, <key>");
        let (_, out) = run(&mut session, &mut book, "[!Print(SelectValue(a,b))]");
        assert_eq!(out, "b");
    }

    #[test]
    fn chained_names_apply_in_order() {
        let mut session = Session::default();
        let mut book = Recorder::default();
        // Keyword first, then Print, over the same argument set
        let (_, out) = run(&mut session, &mut book, "[!(Keyword,Print)(lamp)]");
        assert_eq!(out, "<lamp>");
    }

    #[test]
    fn session_functions() {
        let mut session = Session::default();
        let mut book = Recorder::default();
        session.set_action("x", "look");
        session.create_snapshot();

        let (holds, _) = run(&mut session, &mut book, "[?Bookmark()==#0]");
        assert!(holds);
        assert_eq!(session.bookmarks()[&0], "x:look");

        let (_, out) = run(&mut session, &mut book, "[!Print(GetSnapshots())]");
        assert_eq!(out, "1 x:look");

        run(&mut session, &mut book, "[!BranchSession(second)]");
        assert_eq!(session.name(), "second");
        assert_eq!(book.saved, ["second"]);

        let (holds, _) = run(&mut session, &mut book, "[?GetSnapshotIndex()==#1]");
        assert!(holds);
        let (holds, _) = run(&mut session, &mut book, "[?LoadSnapshot(#0)]");
        assert!(!holds);
    }

    #[test]
    fn load_and_new_session() {
        let mut session = Session::default();
        let mut book = Recorder {
            stored: Some(Session::new(
                folio_session::SessionConfig::default().with_name("stored"),
            )),
            ..Recorder::default()
        };
        let (holds, _) = run(&mut session, &mut book, "[?LoadSession(stored)]");
        assert!(holds);
        assert_eq!(session.name(), "stored");
        let (holds, _) = run(&mut session, &mut book, "[?LoadSession(stored)]");
        assert!(!holds);

        run(&mut session, &mut book, "[!NewSession(fresh)]");
        assert_eq!(session.name(), "fresh");
    }

    #[test]
    fn input_is_trimmed() {
        let mut session = Session::default();
        let mut book = Recorder::default();
        let (_, out) = run(&mut session, &mut book, "[!Print(Input(name))]");
        assert_eq!(out, "answer to name");
    }
}
