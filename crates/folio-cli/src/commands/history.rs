use std::path::Path;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use folio_session::Session;

pub fn run(path: &Path) -> Result<(), String> {
    let session = Session::load(path)
        .map_err(|e| format!("cannot load session {}: {e}", path.display()))?;

    println!("  {} [{}]", session.name().bold(), "session".dimmed());

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "Action", "Bookmark"]);

    for (index, snapshot) in session.snapshots().iter().enumerate() {
        let action = session.snapshot_action(index).unwrap_or("(start)");
        let bookmark = snapshot
            .queue
            .checked_sub(1)
            .and_then(|queue| session.bookmarks().get(&queue))
            .map_or("", String::as_str);
        let marker = if index == session.current_snapshot() {
            format!("{index} *")
        } else {
            index.to_string()
        };
        table.add_row(vec![marker.as_str(), action, bookmark]);
    }

    println!("{table}");
    println!();
    let actions = session.snapshots().len() - 1;
    let bookmarks = session.bookmarks().len();
    println!(
        "  {} action{}, {} bookmark{}",
        actions,
        super::plural(actions),
        bookmarks,
        super::plural(bookmarks),
    );

    Ok(())
}
