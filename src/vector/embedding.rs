//! Embedding generation for queries.
//!
//! This module provides the trait and implementations for turning text into
//! dense vectors. [`FastEmbedGenerator`] uses fastembed with a pretrained
//! sentence model (AllMiniLML6V2 by default). [`HashingEmbedder`] is a
//! deterministic, model-free stand-in for tests and offline runs.

use crate::error::{RetrievalError, RetrieveResult};
use crate::vector::types::{VectorDimension, normalize_vector};
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::path::PathBuf;
use std::sync::Mutex;

/// Trait for generating embeddings from text.
///
/// Implementations must be thread-safe. Callers share one generator
/// across every retrieval request.
pub trait EmbeddingGenerator: Send + Sync {
    /// Generate embeddings for multiple texts.
    ///
    /// # Returns
    /// A vector of embeddings, one for each input text, or an error
    fn generate_embeddings(&self, texts: &[&str]) -> RetrieveResult<Vec<Vec<f32>>>;

    /// Get the dimension of embeddings produced by this generator.
    fn dimension(&self) -> VectorDimension;

    /// Name of the underlying model, for diagnostics.
    fn model_name(&self) -> &str;

    /// Embed a single query string.
    ///
    /// Empty or whitespace-only input is rejected with `EncodingError`.
    fn embed_query(&self, query: &str) -> RetrieveResult<Vec<f32>> {
        if query.trim().is_empty() {
            return Err(RetrievalError::EncodingError {
                reason: "query is empty".to_string(),
            });
        }

        let embedding = self
            .generate_embeddings(&[query])?
            .into_iter()
            .next()
            .ok_or_else(|| RetrievalError::EncodingError {
                reason: "model returned no embedding".to_string(),
            })?;

        self.dimension().validate_vector(&embedding)?;
        Ok(embedding)
    }
}

/// Parse a model name from configuration into a fastembed model.
pub fn parse_embedding_model(name: &str) -> RetrieveResult<EmbeddingModel> {
    match name {
        "AllMiniLML6V2" => Ok(EmbeddingModel::AllMiniLML6V2),
        "AllMiniLML6V2Q" => Ok(EmbeddingModel::AllMiniLML6V2Q),
        "AllMiniLML12V2" => Ok(EmbeddingModel::AllMiniLML12V2),
        "BGESmallENV15" => Ok(EmbeddingModel::BGESmallENV15),
        "BGEBaseENV15" => Ok(EmbeddingModel::BGEBaseENV15),
        "MultilingualE5Small" => Ok(EmbeddingModel::MultilingualE5Small),
        "ParaphraseMLMiniLML12V2" => Ok(EmbeddingModel::ParaphraseMLMiniLML12V2),
        other => Err(RetrievalError::Config {
            reason: format!(
                "Unknown embedding model '{other}'. Supported: AllMiniLML6V2, AllMiniLML6V2Q, \
                 AllMiniLML12V2, BGESmallENV15, BGEBaseENV15, MultilingualE5Small, \
                 ParaphraseMLMiniLML12V2"
            ),
        }),
    }
}

/// FastEmbed implementation backed by a pretrained sentence model.
///
/// The ONNX session is not assumed to be reentrant, so every encode
/// goes through a mutex.
pub struct FastEmbedGenerator {
    model: Mutex<TextEmbedding>,
    model_name: String,
    dimension: VectorDimension,
}

impl std::fmt::Debug for FastEmbedGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedGenerator")
            .field("model", &self.model_name)
            .field("dimension", &self.dimension)
            .finish()
    }
}

impl FastEmbedGenerator {
    /// Load a model by its configured name.
    ///
    /// # Errors
    /// Returns `ModelUnavailable` if the weights cannot be downloaded or loaded.
    pub fn new(
        model_name: &str,
        cache_dir: PathBuf,
        show_download_progress: bool,
    ) -> RetrieveResult<Self> {
        let model = parse_embedding_model(model_name)?;

        let has_cached_models = cache_dir.exists()
            && cache_dir
                .read_dir()
                .is_ok_and(|mut entries| entries.any(|_| true));
        if has_cached_models {
            tracing::info!(model = model_name, "loading embedding model from cache");
        } else {
            tracing::info!(model = model_name, "downloading embedding model (first time only)");
        }

        let mut text_model = TextEmbedding::try_new(
            InitOptions::new(model)
                .with_cache_dir(cache_dir)
                .with_show_download_progress(show_download_progress),
        )
        .map_err(|e| RetrievalError::ModelUnavailable {
            model: model_name.to_string(),
            reason: e.to_string(),
        })?;

        // Measure the output dimension instead of hardcoding it per model
        let sample = text_model
            .embed(vec!["dimension check"], None)
            .map_err(|e| RetrievalError::ModelUnavailable {
                model: model_name.to_string(),
                reason: format!("sample embedding failed: {e}"),
            })?;
        let dimension = sample
            .first()
            .and_then(|v| VectorDimension::new(v.len()))
            .ok_or_else(|| RetrievalError::ModelUnavailable {
                model: model_name.to_string(),
                reason: "model produced an empty embedding".to_string(),
            })?;

        Ok(Self {
            model: Mutex::new(text_model),
            model_name: model_name.to_string(),
            dimension,
        })
    }
}

impl EmbeddingGenerator for FastEmbedGenerator {
    fn generate_embeddings(&self, texts: &[&str]) -> RetrieveResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self
            .model
            .lock()
            .map_err(|_| RetrievalError::MutexPoisoned)?
            .embed(texts.to_vec(), None)
            .map_err(|e| RetrievalError::EncodingError {
                reason: e.to_string(),
            })?;

        for embedding in &embeddings {
            self.dimension.validate_vector(embedding)?;
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Deterministic bag-of-words embedder.
///
/// Lowercased alphanumeric tokens are hashed (FNV-1a) into `dimension`
/// buckets and the result is normalized to unit length. Texts sharing
/// words land close together, identical texts at distance zero.
#[derive(Debug, Clone, Copy)]
pub struct HashingEmbedder {
    dimension: VectorDimension,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(VectorDimension::dimension_384())
    }
}

impl HashingEmbedder {
    #[must_use]
    pub fn new(dimension: VectorDimension) -> Self {
        Self { dimension }
    }

    /// Embed one text without going through the trait.
    #[must_use]
    pub fn embed(&self, text: &str) -> Vec<f32> {
        let dim = self.dimension.get();
        let mut embedding = vec![0.0f32; dim];

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let bucket = (fnv1a(&token.to_lowercase()) % dim as u64) as usize;
            embedding[bucket] += 1.0;
        }

        normalize_vector(&mut embedding);
        embedding
    }
}

impl EmbeddingGenerator for HashingEmbedder {
    fn generate_embeddings(&self, texts: &[&str]) -> RetrieveResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed(text)).collect())
    }

    fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "hashing"
    }
}

fn fnv1a(text: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    text.bytes()
        .fold(OFFSET, |hash, byte| (hash ^ u64::from(byte)).wrapping_mul(PRIME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::types::squared_l2;

    #[test]
    fn test_hashing_embedder_is_deterministic_and_normalized() {
        let embedder = HashingEmbedder::default();
        let a = embedder.embed("The sun rose over the hills.");
        let b = embedder.embed("The sun rose over the hills.");

        assert_eq!(a, b);
        assert_eq!(a.len(), 384);
        let magnitude: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((magnitude - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_hashing_embedder_ranks_overlap_closer() {
        let embedder = HashingEmbedder::default();
        let query = embedder.embed("the sun rose");
        let near = embedder.embed("The sun rose over the hills.");
        let far = embedder.embed("A storm battered the harbor walls.");

        assert!(squared_l2(&query, &near) < squared_l2(&query, &far));
    }

    #[test]
    fn test_embed_query_rejects_empty_input() {
        let embedder = HashingEmbedder::default();
        assert!(matches!(
            embedder.embed_query("   "),
            Err(RetrievalError::EncodingError { .. })
        ));
        assert_eq!(embedder.embed_query("hello").unwrap().len(), 384);
    }

    #[test]
    fn test_parse_embedding_model() {
        assert!(matches!(
            parse_embedding_model("AllMiniLML6V2"),
            Ok(EmbeddingModel::AllMiniLML6V2)
        ));
        assert!(matches!(
            parse_embedding_model("all-MiniLM-L6-v2-typo"),
            Err(RetrievalError::Config { .. })
        ));
    }

    #[test]
    #[ignore = "Downloads 86MB model - run with --ignored for semantic tests"]
    fn test_fastembed_generator_dimension() {
        let cache = tempfile::TempDir::new().unwrap();
        let generator =
            FastEmbedGenerator::new("AllMiniLML6V2", cache.path().to_path_buf(), false).unwrap();

        assert_eq!(generator.dimension().get(), 384);
        let embedding = generator.embed_query("It's so good to be alive").unwrap();
        assert_eq!(embedding.len(), 384);
    }
}
