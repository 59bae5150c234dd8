//! Test: artifact paths in settings.toml resolve against the workspace

use crate::common::{CORPUS, Fixture};
use storyctx::{IvfFlatIndex, MetadataStore, Settings, VectorIndex};

#[test]
fn test_relative_artifact_paths_resolve_from_config_dir() {
    let fixture = Fixture::flat();
    let settings_path = fixture.write_settings("\n[retrieval]\ntop_k = 4\nnprobe = 2\n");

    let settings = Settings::load_from(&settings_path).expect("Should load settings");

    assert_eq!(settings.workspace_root.as_deref(), Some(fixture.path()));
    assert_eq!(settings.index_path(), fixture.index_path);
    assert_eq!(settings.metadata_path(), fixture.metadata_path);
    assert_eq!(settings.retrieval.top_k, 4);

    let index = IvfFlatIndex::open(settings.index_path(), settings.retrieval.nprobe).unwrap();
    let metadata = MetadataStore::load(settings.metadata_path()).unwrap();
    assert_eq!(index.len(), CORPUS.len());
    assert_eq!(metadata.len(), CORPUS.len());
    assert_eq!(index.nprobe(), 2);
}

#[test]
fn test_init_then_load_round_trips_defaults() {
    let fixture = Fixture::flat();
    let settings_path = Settings::init_config_file(fixture.path(), false).unwrap();

    let settings = Settings::load_from(&settings_path).unwrap();
    let defaults = Settings::default();
    assert_eq!(settings.retrieval.top_k, defaults.retrieval.top_k);
    assert_eq!(settings.embedding.model, defaults.embedding.model);
    assert_eq!(settings.index_path(), fixture.index_path);

    // A second init without force must not clobber the file
    assert!(Settings::init_config_file(fixture.path(), false).is_err());
    assert!(Settings::init_config_file(fixture.path(), true).is_ok());
}
