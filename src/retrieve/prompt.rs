//! Prompt-context formatting for retrieved sentences.

use crate::retrieve::RetrievalResult;

/// Format one result as a prompt-context bullet.
pub fn format_context_line(result: &RetrievalResult) -> String {
    format!(
        "- Sentence: {} (from '{}')",
        result.sentence, result.story_title
    )
}

/// Format results as newline-separated bullets, in retrieval order.
pub fn format_context(results: &[RetrievalResult]) -> String {
    results
        .iter()
        .map(format_context_line)
        .collect::<Vec<_>>()
        .join("\n")
}
