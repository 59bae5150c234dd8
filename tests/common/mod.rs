#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use storyctx::vector::{IvfPartitions, normalize_vector};
use storyctx::{HashingEmbedder, IvfFlatIndex, MetadataStore, Retriever, VectorDimension};
use tempfile::TempDir;

/// Small story corpus, `(sentence, story_title)` in corpus order.
pub const CORPUS: &[(&str, &str)] = &[
    ("The sun rose over the hills.", "Dawn"),
    ("Rain fell on the old roof all night.", "Storm"),
    ("The ship left the harbor at midnight.", "Voyage"),
    ("She counted coins by candlelight.", "Merchant"),
    ("Thunder rolled across the valley.", "Storm"),
    ("A fox slipped between birch trees.", "Winter Woods"),
    ("The lighthouse keeper wrote a letter.", "Voyage"),
    ("Children chased kites along the shore.", "Summer"),
    ("Snow buried the mountain pass.", "Winter Woods"),
    ("He sold bread at the morning market.", "Merchant"),
    ("Waves broke against black rocks.", "Voyage"),
    ("It's so good to be alive, she sang.", "Summer"),
];

/// Artifacts written to a temporary directory.
pub struct Fixture {
    pub dir: TempDir,
    pub index_path: PathBuf,
    pub metadata_path: PathBuf,
}

impl Fixture {
    /// Exact (flat) index over [`CORPUS`].
    pub fn flat() -> Self {
        Self::build(CORPUS, None)
    }

    /// IVF index over [`CORPUS`] with `nlist` partitions.
    pub fn partitioned(nlist: usize) -> Self {
        Self::build(CORPUS, Some(nlist))
    }

    pub fn build(corpus: &[(&str, &str)], nlist: Option<usize>) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let index_path = dir.path().join("faiss_index");
        let metadata_path = dir.path().join("metadata.csv");

        let embedder = HashingEmbedder::default();
        let vectors: Vec<Vec<f32>> = corpus.iter().map(|(s, _)| embedder.embed(s)).collect();
        let partitions = nlist.map(|nlist| round_robin_partitions(&vectors, nlist));

        IvfFlatIndex::write(&index_path, dimension(), &vectors, partitions.as_ref())
            .expect("Failed to write index");
        write_metadata_csv(&metadata_path, corpus);

        Self {
            dir,
            index_path,
            metadata_path,
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Retriever over the fixture with the hashing embedder.
    pub fn retriever(&self, nprobe: usize) -> Retriever {
        let index = IvfFlatIndex::open(&self.index_path, nprobe).expect("Failed to open index");
        let metadata = MetadataStore::load(&self.metadata_path).expect("Failed to load metadata");
        Retriever::new(
            Arc::new(HashingEmbedder::default()),
            Arc::new(index),
            Arc::new(metadata),
        )
        .expect("Artifacts should align")
    }

    /// Write `.storyctx/settings.toml` pointing at the fixture artifacts.
    pub fn write_settings(&self, extra: &str) -> PathBuf {
        let config_dir = self.path().join(".storyctx");
        fs::create_dir_all(&config_dir).expect("Failed to create config dir");
        let settings_path = config_dir.join("settings.toml");
        let content = format!(
            "version = 1\n\n[artifacts]\nindex_path = \"faiss_index\"\nmetadata_path = \"metadata.csv\"\n{extra}"
        );
        fs::write(&settings_path, content).expect("Failed to write settings");
        settings_path
    }
}

pub fn dimension() -> VectorDimension {
    VectorDimension::dimension_384()
}

/// Metadata CSV as pandas writes it: a leading unnamed index column.
pub fn write_metadata_csv(path: &Path, corpus: &[(&str, &str)]) {
    let mut writer = csv::Writer::from_path(path).expect("Failed to create metadata");
    writer
        .write_record(["", "Sentence", "StoryTitle"])
        .expect("Failed to write header");
    for (i, (sentence, title)) in corpus.iter().enumerate() {
        writer
            .write_record([i.to_string().as_str(), sentence, title])
            .expect("Failed to write row");
    }
    writer.flush().expect("Failed to flush metadata");
}

/// Assign rows to partitions round-robin with normalized-mean centroids.
fn round_robin_partitions(vectors: &[Vec<f32>], nlist: usize) -> IvfPartitions {
    let dim = dimension().get();
    let assignments: Vec<u32> = (0..vectors.len()).map(|i| (i % nlist) as u32).collect();

    let mut centroids = vec![vec![0.0f32; dim]; nlist];
    for (vector, &partition) in vectors.iter().zip(&assignments) {
        for (c, v) in centroids[partition as usize].iter_mut().zip(vector) {
            *c += v;
        }
    }
    for centroid in &mut centroids {
        normalize_vector(centroid);
    }

    IvfPartitions {
        centroids,
        assignments,
    }
}
