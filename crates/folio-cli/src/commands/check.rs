use std::path::Path;

pub fn run(story: &Path) -> Result<(), String> {
    let result = super::parse_story(story)?;
    if result.has_errors() {
        return Err("story has errors".into());
    }

    let verbs: usize = result.story.pages().map(|p| p.verbs().len()).sum();
    println!("  All checks passed for '{}'.", story.display());
    println!(
        "  {} page{}, {} verb{}, {} pattern{}",
        result.story.page_count(),
        super::plural(result.story.page_count()),
        verbs,
        super::plural(verbs),
        result.story.pattern_count(),
        super::plural(result.story.pattern_count()),
    );

    Ok(())
}
