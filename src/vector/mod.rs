//! Vector search functionality for sentence retrieval.
//!
//! This module provides query embedding and nearest-neighbor search over a
//! pre-built, memory-mapped index of corpus sentence embeddings.
//!
//! # Architecture
//! The index uses IVF-flat layout: vectors are grouped into partitions by
//! nearest centroid at build time, and a query scans only the closest
//! partitions. An index without partitions is searched exhaustively.

mod embedding;
mod index;
mod types;

// Re-export core types for public API
pub use embedding::{
    EmbeddingGenerator, FastEmbedGenerator, HashingEmbedder, parse_embedding_model,
};
pub use index::{DEFAULT_NPROBE, IndexFileError, IvfFlatIndex, IvfPartitions, VectorIndex};
pub use types::{
    SENTINEL_DISTANCE, SENTINEL_POSITION, SearchHits, VECTOR_DIMENSION_384, VectorDimension,
    normalize_vector, squared_l2,
};
