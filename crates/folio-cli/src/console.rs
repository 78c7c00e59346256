//! A [`Book`] backed by the terminal.
//!
//! Menus and dialogs are printed to stdout and answered with a line of
//! input. Stored sessions are `<name>.session` files in one directory.

use std::io::{self, BufRead, StdinLock, Write};
use std::path::{Path, PathBuf};

use colored::Colorize;
use folio_engine::Book;
use folio_session::Session;

const SESSION_EXTENSION: &str = "session";

pub struct ConsoleBook<R> {
    input: R,
    session_dir: PathBuf,
    quit: bool,
}

impl ConsoleBook<StdinLock<'static>> {
    /// Read answers from stdin, storing sessions in `session_dir` (default:
    /// the current directory).
    pub fn stdin(session_dir: Option<&Path>) -> Self {
        Self::new(io::stdin().lock(), session_dir.unwrap_or(Path::new(".")))
    }
}

impl<R: BufRead> ConsoleBook<R> {
    pub fn new(input: R, session_dir: &Path) -> Self {
        Self {
            input,
            session_dir: session_dir.to_path_buf(),
            quit: false,
        }
    }

    /// Print `prompt` and read one line, without its line ending.
    /// `None` at end of input.
    pub fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        print!("{prompt}");
        io::stdout().flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    /// Whether the story asked to leave.
    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    fn session_path(&self, name: &str) -> PathBuf {
        let file = name.replace(['/', '\\'], "_");
        self.session_dir.join(format!("{file}.{SESSION_EXTENSION}"))
    }
}

impl<R: BufRead> Book for ConsoleBook<R> {
    fn play(&mut self, asset: &str) {
        println!("  {}", format!("[playing {asset}]").dimmed());
    }

    fn stop(&mut self, asset: &str) {
        println!("  {}", format!("[stopped {asset}]").dimmed());
    }

    fn select_value(&mut self, options: &[String]) -> Option<usize> {
        if options.is_empty() {
            return None;
        }
        for (i, option) in options.iter().enumerate() {
            println!("  {}. {option}", i + 1);
        }
        let answer = self.read_line("choose> ").ok().flatten()?;
        let choice: usize = answer.trim().parse().ok()?;
        choice.checked_sub(1).filter(|&i| i < options.len())
    }

    fn open_menu(&mut self, name: &str) {
        println!("  {}", format!("[menu: {name}]").dimmed());
    }

    fn quit(&mut self) {
        self.quit = true;
    }

    fn sessions(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(&self.session_dir) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == SESSION_EXTENSION))
            .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect();
        names.sort();
        names
    }

    fn save_session(&mut self, session: &Session) -> bool {
        let path = self.session_path(session.name());
        match session.save(&path) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "session not saved");
                false
            }
        }
    }

    fn load_session(&mut self, name: &str) -> Option<Session> {
        let path = self.session_path(name);
        match Session::load(&path) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "session not loaded");
                None
            }
        }
    }

    fn dialog(&mut self, message: &str) -> bool {
        let prompt = format!("{message} [y/n] ");
        self.read_line(&prompt)
            .ok()
            .flatten()
            .is_some_and(|a| a.trim().to_ascii_lowercase().starts_with('y'))
    }

    fn input(&mut self, prompt: &str) -> Option<String> {
        self.read_line(&format!("{prompt} ")).ok().flatten()
    }
}
