pub mod check;
pub mod export;
pub mod history;
pub mod pages;
pub mod play;
pub mod read;

use std::path::Path;

use colored::Colorize;
use folio_dsl::{Diagnostic, LoadResult, Severity, Story, render_diagnostics};
use folio_engine::{Engine, EngineConfig};
use folio_session::{Session, SessionConfig};

/// Parse a story file and print its diagnostics.
/// Returns the story if there are no errors.
fn load_story(path: &Path) -> Result<Story, String> {
    let result = parse_story(path)?;
    if result.has_errors() {
        Err("story has errors".into())
    } else {
        Ok(result.story)
    }
}

/// Parse a story file and print its diagnostics, errors or not.
fn parse_story(path: &Path) -> Result<LoadResult, String> {
    let source = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    let result = folio_dsl::load_story(&source);
    print_diagnostics(&source, path, &result.diagnostics);
    Ok(result)
}

/// Print diagnostics to stderr using ariadne, followed by a count.
fn print_diagnostics(source: &str, path: &Path, diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }

    let filename = path.display().to_string();
    let rendered = render_diagnostics(source, &filename, diagnostics);
    eprint!("{rendered}");

    let (errors, warnings) = count(diagnostics);
    if errors > 0 {
        eprintln!(
            "  {} error{}, {} warning{}",
            errors,
            plural(errors),
            warnings,
            plural(warnings),
        );
    } else if warnings > 0 {
        eprintln!("  {} warning{}", warnings, plural(warnings));
    }
}

/// Print diagnostics raised while running a story, one line each.
fn print_runtime_diagnostics(diagnostics: &[Diagnostic]) {
    for d in diagnostics {
        let line = d.to_string();
        match d.severity {
            Severity::Error => eprintln!("  {}", line.red()),
            Severity::Warning => eprintln!("  {}", line.yellow()),
        }
    }
}

fn count(diagnostics: &[Diagnostic]) -> (usize, usize) {
    let errors = diagnostics.iter().filter(|d| d.is_error()).count();
    (errors, diagnostics.len() - errors)
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

/// Build an engine for `story_path`, continuing from `session` if the file
/// exists. A fresh session is named after the story file.
fn open_engine(story_path: &Path, session: Option<&Path>) -> Result<Engine, String> {
    let story = load_story(story_path)?;
    let session = match session {
        Some(path) if path.exists() => Session::load(path)
            .map_err(|e| format!("cannot load session {}: {e}", path.display()))?,
        _ => {
            let name = story_path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            Session::new(SessionConfig::default().with_name(name))
        }
    };
    Ok(Engine::new(story, EngineConfig::default()).with_session(session))
}
