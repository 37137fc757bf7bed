//! Report export
//!
//! Writes generated text to disk as Markdown or as plain text with
//! Markdown markers replaced by readable equivalents.

use paperdigest_common::errors::Result;
use std::path::Path;
use tracing::info;

/// Flatten Markdown headings and list markers into plain text
pub fn to_plain_text(markdown: &str) -> String {
    markdown
        .split('\n')
        .map(|line| {
            if let Some(heading) = line.strip_prefix("# ") {
                format!("{} (Heading)", heading)
            } else if let Some(heading) = line.strip_prefix("## ") {
                format!("{} (Subheading)", heading)
            } else if let Some(item) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
                format!("• {}", item)
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Write `content` unchanged, creating parent directories as needed
pub fn write_markdown(path: &Path, content: &str) -> Result<()> {
    write_file(path, content)
}

/// Write `content` converted with [`to_plain_text`]
pub fn write_plain_text(path: &Path, content: &str) -> Result<()> {
    write_file(path, &to_plain_text(content))
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    info!(path = %path.display(), bytes = content.len(), "Report written");
    Ok(())
}
