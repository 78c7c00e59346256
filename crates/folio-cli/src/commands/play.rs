use std::path::Path;

use colored::Colorize;
use folio_engine::Engine;

use crate::console::ConsoleBook;

const HELP: &str = "\
  <noun>            list what you can do with a noun
  <noun> <verb>     take an action (also <noun>:<verb>)
  undo, redo        step through the history
  bookmark [text]   bookmark the last action
  save [FILE]       write the session
  pages             list the nouns of the story
  quit              leave";

/// One line typed at the play prompt.
#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Help,
    Pages,
    Quit,
    Undo,
    Redo,
    Save(Option<&'a str>),
    Bookmark(Option<&'a str>),
    Look(&'a str),
    Act(&'a str, &'a str),
}

impl<'a> Command<'a> {
    fn parse(input: &'a str) -> Self {
        if let Some((noun, verb)) = input.split_once(':') {
            return Command::Act(noun.trim(), verb.trim());
        }
        let (head, rest) = match input.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, Some(rest.trim()).filter(|r| !r.is_empty())),
            None => (input, None),
        };
        match (head.to_ascii_lowercase().as_str(), rest) {
            ("help" | "?", None) => Command::Help,
            ("pages", None) => Command::Pages,
            ("quit" | "q", None) => Command::Quit,
            ("undo", None) => Command::Undo,
            ("redo", None) => Command::Redo,
            ("save", file) => Command::Save(file),
            ("bookmark", text) => Command::Bookmark(text),
            (_, None) => Command::Look(head),
            (_, Some(verb)) => Command::Act(head, verb),
        }
    }
}

pub fn run(story: &Path, session: Option<&Path>) -> Result<(), String> {
    let mut engine = super::open_engine(story, session)?;
    let mut book = ConsoleBook::stdin(session.and_then(Path::parent));

    println!("  {} {}", "Playing".bold(), engine.session().name());
    println!("  Pages: {}", page_names(&engine));
    println!("  Type 'help' for commands, 'quit' to exit.\n");

    while let Some(line) = book.read_line("> ").map_err(|e| e.to_string())? {
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match Command::parse(input) {
            Command::Help => println!("{HELP}"),
            Command::Pages => println!("  {}", page_names(&engine)),
            Command::Quit => break,
            Command::Undo => {
                if engine.session_mut().undo_snapshot() {
                    println!("  Back to {}.", position(&engine));
                } else {
                    println!("{}", "  Nothing to undo.".yellow());
                }
            }
            Command::Redo => {
                if engine.session_mut().redo_snapshot() {
                    println!("  Forward to {}.", position(&engine));
                } else {
                    println!("{}", "  Nothing to redo.".yellow());
                }
            }
            Command::Save(file) => match file.map(Path::new).or(session) {
                Some(path) => match engine.save_session(path) {
                    Ok(()) => println!("  Saved to {}.", path.display()),
                    Err(e) => println!("  {}", e.to_string().yellow()),
                },
                None => println!("{}", "  No session file; use 'save FILE'.".yellow()),
            },
            Command::Bookmark(text) => match engine.session_mut().add_bookmark(text) {
                Some(queue) => {
                    let description = engine
                        .session()
                        .bookmarks()
                        .get(&queue)
                        .cloned()
                        .unwrap_or_default();
                    println!("  Bookmarked: {description}");
                }
                None => println!("{}", "  Nothing to bookmark yet.".yellow()),
            },
            Command::Look(noun) => match engine.get_verbs(noun, &mut book) {
                Ok(verbs) if verbs.is_empty() => println!("  Nothing to do with {noun}."),
                Ok(verbs) => println!("  {noun}: {}", verbs.join(", ")),
                Err(e) => println!("  {}", e.to_string().yellow()),
            },
            Command::Act(noun, verb) => match engine.act(noun, verb, &mut book) {
                Ok(reading) => {
                    super::print_runtime_diagnostics(&reading.diagnostics);
                    if !reading.text.is_empty() {
                        println!("{}", reading.text);
                    }
                }
                Err(e) => println!("  {}", e.to_string().yellow()),
            },
        }
        println!();

        if book.quit_requested() {
            break;
        }
    }

    Ok(())
}

fn page_names(engine: &Engine) -> String {
    engine
        .story()
        .pages()
        .map(|p| p.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// The current snapshot, described by the action that produced it.
fn position(engine: &Engine) -> String {
    let session = engine.session();
    let current = session.current_snapshot();
    match session.snapshot_action(current) {
        Some(action) => format!("#{current} ({action})"),
        None => "the start".to_string(),
    }
}
