use std::path::Path;

use comfy_table::{ContentArrangement, Table};

pub fn run(story: &Path) -> Result<(), String> {
    let story = super::load_story(story)?;

    if story.page_count() == 0 {
        println!("  No pages found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Noun", "Verbs", "Default"]);

    for page in story.pages() {
        let verbs = page
            .verbs()
            .iter()
            .map(|v| {
                if v.names.len() > 1 {
                    v.names.join(" / ")
                } else {
                    v.visual_name.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        let defaults = if page.defaults.is_empty() {
            "-".to_string()
        } else {
            page.defaults.to_string()
        };
        table.add_row(vec![page.name.as_str(), verbs.as_str(), defaults.as_str()]);
    }

    println!("{table}");
    println!();
    println!(
        "  {} page{}",
        story.page_count(),
        super::plural(story.page_count())
    );

    Ok(())
}
