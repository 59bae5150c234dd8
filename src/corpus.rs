//! Metadata store for corpus sentences.
//!
//! Row `i` of the metadata file describes the sentence whose embedding is
//! row `i` of the vector index. Position is the only join key between them.

use crate::error::{RetrievalError, RetrieveResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One sentence of the reference corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusEntry {
    pub position: usize,
    pub sentence: String,
    pub story_title: String,
}

/// CSV row shape. Extra columns (e.g. a pandas index) are ignored.
#[derive(Debug, Deserialize)]
struct MetadataRow {
    #[serde(rename = "Sentence")]
    sentence: String,
    #[serde(rename = "StoryTitle")]
    story_title: String,
}

/// Position-indexed, read-only table of sentence/title pairs.
#[derive(Debug, Clone, Default)]
pub struct MetadataStore {
    entries: Vec<CorpusEntry>,
}

impl MetadataStore {
    /// Load metadata from a CSV file with `Sentence` and `StoryTitle` columns.
    ///
    /// # Errors
    /// Returns `MetadataUnavailable` if the file cannot be read, lacks a
    /// required column, or contains a malformed row.
    pub fn load(path: impl AsRef<Path>) -> RetrieveResult<Self> {
        let path = path.as_ref();
        let unavailable = |reason: String| RetrievalError::MetadataUnavailable {
            path: path.to_path_buf(),
            reason,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_path(path)
            .map_err(|e| unavailable(e.to_string()))?;

        let headers = reader
            .headers()
            .map_err(|e| unavailable(e.to_string()))?
            .clone();
        for required in ["Sentence", "StoryTitle"] {
            if !headers.iter().any(|h| h == required) {
                return Err(unavailable(format!("missing required column '{required}'")));
            }
        }

        let mut entries = Vec::new();
        for (position, row) in reader.deserialize::<MetadataRow>().enumerate() {
            let row = row.map_err(|e| unavailable(format!("row {position}: {e}")))?;
            entries.push(CorpusEntry {
                position,
                sentence: row.sentence,
                story_title: row.story_title,
            });
        }

        tracing::info!(path = %path.display(), rows = entries.len(), "loaded corpus metadata");
        Ok(Self { entries })
    }

    /// Build a store from `(sentence, story_title)` pairs in position order.
    pub fn from_entries<I, S, T>(rows: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<String>,
    {
        let entries = rows
            .into_iter()
            .enumerate()
            .map(|(position, (sentence, story_title))| CorpusEntry {
                position,
                sentence: sentence.into(),
                story_title: story_title.into(),
            })
            .collect();
        Self { entries }
    }

    /// Look up the entry at an index position.
    ///
    /// Positions come straight from the vector index and may be the `-1`
    /// sentinel, so they are signed here.
    pub fn get(&self, position: i64) -> RetrieveResult<&CorpusEntry> {
        usize::try_from(position)
            .ok()
            .and_then(|p| self.entries.get(p))
            .ok_or(RetrievalError::PositionOutOfRange {
                position,
                len: self.entries.len(),
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CorpusEntry> {
        self.entries.iter()
    }
}
