use std::path::Path;

use crate::console::ConsoleBook;

pub fn run(story: &Path, noun: &str, verb: &str, session: Option<&Path>) -> Result<(), String> {
    let mut engine = super::open_engine(story, session)?;
    let mut book = ConsoleBook::stdin(session.and_then(Path::parent));

    let reading = engine
        .act(noun, verb, &mut book)
        .map_err(|e| e.to_string())?;
    super::print_runtime_diagnostics(&reading.diagnostics);
    if !reading.text.is_empty() {
        println!("{}", reading.text);
    }

    if let Some(path) = session {
        engine
            .save_session(path)
            .map_err(|e| format!("cannot save session {}: {e}", path.display()))?;
    }

    Ok(())
}
