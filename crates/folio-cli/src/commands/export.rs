use std::path::Path;

pub fn run(story: &Path, output: Option<&Path>) -> Result<(), String> {
    let story = super::load_story(story)?;

    let content = serde_json::to_string_pretty(&story)
        .map_err(|e| format!("JSON serialization error: {e}"))?;

    if let Some(path) = output {
        std::fs::write(path, format!("{content}\n"))
            .map_err(|e| format!("cannot write to {}: {e}", path.display()))?;
        println!("  Exported to {}", path.display());
    } else {
        println!("{content}");
    }

    Ok(())
}
