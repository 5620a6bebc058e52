//! Prompt assembly for answer synthesis.

use quarry_index::ScoredChunk;

const PROMPT_HEADER: &str = "Use the following pieces of context to answer the question at the end.\nIf you don't know the answer, just say that you don't know, don't try to make up an answer.";

/// Build the single user message: instructions, the retrieved chunks joined
/// by blank lines, then the question.
#[must_use]
pub fn build_prompt(hits: &[ScoredChunk<'_>], question: &str) -> String {
    let context = hits
        .iter()
        .map(|hit| hit.chunk.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("{PROMPT_HEADER}\n\nContext: {context}\n\nQuestion: {question}\n\nAnswer:")
}
