//! Turns fetched repository content into ordered text blocks for indexing.

use chrono::SecondsFormat;
use quarry_github::RepositoryContent;

/// Assemble the corpus blocks: README first, one block per file in walk
/// order, then a single aggregate block for the commit history. Empty
/// sections produce no block.
#[must_use]
pub fn prepare_blocks(content: &RepositoryContent) -> Vec<String> {
    let mut blocks = Vec::new();

    if !content.readme.is_empty() {
        blocks.push(format!("README.md:\n{}", content.readme));
    }

    for file in &content.files {
        blocks.push(format!(
            "File: {} (Type: {})\nContent:\n{}",
            file.path,
            file.file_type.to_uppercase(),
            file.content
        ));
    }

    if !content.commits.is_empty() {
        let mut block = String::from("Recent Commits:\n");
        for commit in &content.commits {
            block.push_str(&format!(
                "Commit: {}\nMessage: {}\nDate: {}\n\n",
                commit.sha,
                commit.message,
                commit.date.to_rfc3339_opts(SecondsFormat::Secs, true)
            ));
        }
        blocks.push(block);
    }

    blocks
}
