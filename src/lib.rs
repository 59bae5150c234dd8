//! The main library module for storyctx
//!
//! Retrieves the corpus sentences closest to a query string from a
//! pre-built vector index, for use as prompt context.

pub mod config;
pub mod corpus;
pub mod display;
pub mod error;
pub mod io;
pub mod logging;
pub mod retrieve;
pub mod vector;

// Explicit exports for better API clarity
pub use config::Settings;
pub use corpus::{CorpusEntry, MetadataStore};
pub use error::{RetrievalError, RetrieveResult};
pub use retrieve::{RetrievalResult, Retriever, RetrieverInfo, format_context};
pub use vector::{
    EmbeddingGenerator, FastEmbedGenerator, HashingEmbedder, IvfFlatIndex, SearchHits,
    VectorDimension, VectorIndex,
};
