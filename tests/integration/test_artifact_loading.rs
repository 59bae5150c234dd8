//! Startup validation of the index and metadata artifacts.

use crate::common::{CORPUS, Fixture, write_metadata_csv};
use std::sync::Arc;
use storyctx::io::ExitCode;
use storyctx::{
    HashingEmbedder, IvfFlatIndex, MetadataStore, RetrievalError, Retriever, VectorDimension,
};

#[test]
fn test_row_count_mismatch_is_rejected() {
    let fixture = Fixture::flat();
    // Drop the last metadata row
    write_metadata_csv(&fixture.metadata_path, &CORPUS[..CORPUS.len() - 1]);

    let index = IvfFlatIndex::open(&fixture.index_path, 1).unwrap();
    let metadata = MetadataStore::load(&fixture.metadata_path).unwrap();
    let err = Retriever::new(
        Arc::new(HashingEmbedder::default()),
        Arc::new(index),
        Arc::new(metadata),
    )
    .unwrap_err();

    assert!(matches!(
        err,
        RetrievalError::ArtifactMismatch { index_len, metadata_len }
            if index_len == CORPUS.len() && metadata_len == CORPUS.len() - 1
    ));
    assert!(ExitCode::from_error(&err).is_blocking());
}

#[test]
fn test_embedder_dimension_must_match_index() {
    let fixture = Fixture::flat();
    let index = IvfFlatIndex::open(&fixture.index_path, 1).unwrap();
    let metadata = MetadataStore::load(&fixture.metadata_path).unwrap();

    let err = Retriever::new(
        Arc::new(HashingEmbedder::new(VectorDimension::new(128).unwrap())),
        Arc::new(index),
        Arc::new(metadata),
    )
    .unwrap_err();

    assert!(matches!(
        err,
        RetrievalError::DimensionMismatch {
            expected: 384,
            actual: 128
        }
    ));
}

#[test]
fn test_missing_index_is_unavailable() {
    let fixture = Fixture::flat();
    std::fs::remove_file(&fixture.index_path).unwrap();

    let err = IvfFlatIndex::open(&fixture.index_path, 1).unwrap_err();
    assert!(matches!(err, RetrievalError::IndexUnavailable { .. }));
    assert!(err.is_startup_failure());
}

#[test]
fn test_truncated_index_is_unavailable() {
    let fixture = Fixture::flat();
    let bytes = std::fs::read(&fixture.index_path).unwrap();
    std::fs::write(&fixture.index_path, &bytes[..bytes.len() - 7]).unwrap();

    let err = IvfFlatIndex::open(&fixture.index_path, 1).unwrap_err();
    assert!(matches!(err, RetrievalError::IndexUnavailable { .. }));
}

#[test]
fn test_metadata_without_story_title_is_unavailable() {
    let fixture = Fixture::flat();
    std::fs::write(&fixture.metadata_path, "Sentence,Title\nRain fell.,Storm\n").unwrap();

    let err = MetadataStore::load(&fixture.metadata_path).unwrap_err();
    assert!(matches!(err, RetrievalError::MetadataUnavailable { .. }));
    assert_eq!(ExitCode::from_error(&err), ExitCode::BlockingError);
}

#[test]
fn test_info_describes_loaded_artifacts() {
    let fixture = Fixture::partitioned(3);
    let info = fixture.retriever(2).info();

    assert_eq!(info.model, "hashing");
    assert_eq!(info.dimension, 384);
    assert_eq!(info.entries, CORPUS.len());
    assert_eq!(info.partitions, 3);
}
