//! Retrieval with the real sentence model.
//!
//! Downloads model weights on first run, so these are ignored by default.
//! Run with `cargo test -- --ignored`.

use crate::common::{CORPUS, write_metadata_csv};
use std::sync::Arc;
use storyctx::{
    EmbeddingGenerator, FastEmbedGenerator, IvfFlatIndex, MetadataStore, Retriever,
};
use tempfile::TempDir;

#[test]
#[ignore = "downloads the AllMiniLML6V2 model"]
fn test_semantic_neighbor_beats_unrelated_sentences() {
    let dir = TempDir::new().unwrap();
    // Model weights land inside the temp dir and go away with it
    let cache = TempDir::new().unwrap();
    let embedder =
        FastEmbedGenerator::new("AllMiniLML6V2", cache.path().to_path_buf(), false).unwrap();
    assert_eq!(embedder.dimension().get(), 384);

    let sentences: Vec<&str> = CORPUS.iter().map(|(s, _)| *s).collect();
    let vectors = embedder.generate_embeddings(&sentences).unwrap();

    let index_path = dir.path().join("faiss_index");
    let metadata_path = dir.path().join("metadata.csv");
    IvfFlatIndex::write(&index_path, embedder.dimension(), &vectors, None).unwrap();
    write_metadata_csv(&metadata_path, CORPUS);

    let retriever = Retriever::new(
        Arc::new(embedder),
        Arc::new(IvfFlatIndex::open(&index_path, 1).unwrap()),
        Arc::new(MetadataStore::load(&metadata_path).unwrap()),
    )
    .unwrap();

    let results = retriever.retrieve("dawn breaking above the hills", 3).unwrap();
    assert_eq!(results[0].story_title, "Dawn");

    let results = retriever.retrieve("It's so good to be alive", 1).unwrap();
    assert_eq!(results[0].sentence, "It's so good to be alive, she sang.");
}
