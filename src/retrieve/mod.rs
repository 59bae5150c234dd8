//! Query-time retrieval: embed, search, join to metadata.
//!
//! [`Retriever`] is the single entry point the prompt builder calls. It owns
//! long-lived handles to the embedding model, the vector index and the
//! metadata store, all of which are immutable after construction.

pub mod prompt;

use crate::config::Settings;
use crate::corpus::MetadataStore;
use crate::error::{RetrievalError, RetrieveResult};
use crate::vector::{
    EmbeddingGenerator, FastEmbedGenerator, IvfFlatIndex, SENTINEL_POSITION, VectorIndex,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub use prompt::{format_context, format_context_line};

/// One retrieved sentence, closest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub sentence: String,
    pub story_title: String,
    /// Squared L2 distance from the query embedding.
    pub distance: f64,
}

impl fmt::Display for RetrievalResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, distance {:.4})",
            self.sentence, self.story_title, self.distance
        )
    }
}

/// Shape of the loaded artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrieverInfo {
    pub model: String,
    pub dimension: usize,
    pub entries: usize,
    pub partitions: usize,
}

impl fmt::Display for RetrieverInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Model: {}", self.model)?;
        writeln!(f, "Dimension: {}", self.dimension)?;
        writeln!(f, "Entries: {}", self.entries)?;
        write!(f, "Partitions: {}", self.partitions)
    }
}

/// Embeds queries and joins nearest-neighbor hits to corpus metadata.
pub struct Retriever {
    embedder: Arc<dyn EmbeddingGenerator>,
    index: Arc<dyn VectorIndex>,
    metadata: Arc<MetadataStore>,
}

impl fmt::Debug for Retriever {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retriever")
            .field("model", &self.embedder.model_name())
            .field("dimension", &self.index.dimension())
            .field("entries", &self.metadata.len())
            .field("partitions", &self.index.partition_count())
            .finish()
    }
}

impl Retriever {
    /// Assemble a retriever from already-loaded parts.
    ///
    /// # Errors
    /// - `DimensionMismatch` if the embedder and index disagree on dimension
    /// - `ArtifactMismatch` if the index and metadata differ in length
    pub fn new(
        embedder: Arc<dyn EmbeddingGenerator>,
        index: Arc<dyn VectorIndex>,
        metadata: Arc<MetadataStore>,
    ) -> RetrieveResult<Self> {
        if embedder.dimension() != index.dimension() {
            return Err(RetrievalError::DimensionMismatch {
                expected: index.dimension().get(),
                actual: embedder.dimension().get(),
            });
        }

        if index.len() != metadata.len() {
            return Err(RetrievalError::ArtifactMismatch {
                index_len: index.len(),
                metadata_len: metadata.len(),
            });
        }

        Ok(Self {
            embedder,
            index,
            metadata,
        })
    }

    /// Load every artifact named in `settings` and assemble a retriever.
    ///
    /// Index and metadata load before the model so a bad path fails
    /// without waiting on a model download.
    pub fn from_settings(settings: &Settings) -> RetrieveResult<Self> {
        let started = Instant::now();

        let index = IvfFlatIndex::open(settings.index_path(), settings.retrieval.nprobe)?;
        let metadata = MetadataStore::load(settings.metadata_path())?;
        let embedder = FastEmbedGenerator::new(
            &settings.embedding.model,
            settings.models_dir(),
            settings.embedding.show_download_progress,
        )?;

        let retriever = Self::new(Arc::new(embedder), Arc::new(index), Arc::new(metadata))?;
        tracing::info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            entries = retriever.len(),
            "retriever ready"
        );
        Ok(retriever)
    }

    /// Return up to `top_k` corpus sentences closest to `query`.
    ///
    /// Results keep the index's ascending-distance order. Sentinel or
    /// out-of-range positions are skipped, so fewer than `top_k` results
    /// may come back. Embedding and search errors propagate unchanged.
    pub fn retrieve(&self, query: &str, top_k: usize) -> RetrieveResult<Vec<RetrievalResult>> {
        let started = Instant::now();

        let query_vector = self.embedder.embed_query(query)?;
        // Padding past the corpus size would only yield sentinels
        let hits = self
            .index
            .search(&query_vector, top_k.min(self.index.len()))?;

        let mut results = Vec::with_capacity(hits.len());
        for (distance, position) in hits.iter() {
            match self.metadata.get(position) {
                Ok(entry) => results.push(RetrievalResult {
                    sentence: entry.sentence.clone(),
                    story_title: entry.story_title.clone(),
                    distance: f64::from(distance),
                }),
                Err(RetrievalError::PositionOutOfRange { position, len })
                    if position == SENTINEL_POSITION =>
                {
                    tracing::debug!(len, "index returned fewer hits than requested");
                }
                Err(RetrievalError::PositionOutOfRange { position, len }) => {
                    tracing::warn!(position, len, "skipping hit outside metadata range");
                }
                Err(e) => return Err(e),
            }
        }

        tracing::debug!(
            top_k,
            returned = results.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "retrieve"
        );
        Ok(results)
    }

    /// Run [`Retriever::retrieve`] on the blocking pool with a deadline.
    ///
    /// The search is not interrupted when the deadline passes; its result
    /// is discarded.
    pub async fn retrieve_with_timeout(
        self: Arc<Self>,
        query: String,
        top_k: usize,
        timeout: Duration,
    ) -> RetrieveResult<Vec<RetrievalResult>> {
        let task = tokio::task::spawn_blocking(move || self.retrieve(&query, top_k));

        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(RetrievalError::TaskFailed {
                reason: join_error.to_string(),
            }),
            Err(_) => Err(RetrievalError::Timeout {
                millis: timeout.as_millis() as u64,
            }),
        }
    }

    pub fn info(&self) -> RetrieverInfo {
        RetrieverInfo {
            model: self.embedder.model_name().to_string(),
            dimension: self.index.dimension().get(),
            entries: self.metadata.len(),
            partitions: self.index.partition_count(),
        }
    }

    /// Number of corpus entries.
    pub fn len(&self) -> usize {
        self.metadata.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }

    pub fn index(&self) -> &dyn VectorIndex {
        self.index.as_ref()
    }

    pub fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }
}
