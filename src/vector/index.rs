//! Memory-mapped IVF-flat vector index.
//!
//! The index is a pre-built, read-only artifact. Row `i` of the vector
//! section is the embedding of corpus position `i`. When the file carries
//! partitions (inverted lists keyed by nearest centroid), a query scans only
//! the `nprobe` closest partitions; otherwise every row is scanned.
//!
//! # Storage Format
//!
//! All integers and floats are little-endian.
//! - Header (20 bytes): magic `SCIX`, version, dimension, vector count, partition count
//! - Centroids: `nlist * dimension` f32
//! - Partition ids: `count` u32, present only when `nlist > 0`
//! - Vectors: `count * dimension` f32, row-major in corpus order
//!
//! Distances are squared Euclidean, matching a FAISS `IndexFlatL2`.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use memmap2::{Mmap, MmapOptions};
use rayon::prelude::*;
use thiserror::Error;

use crate::error::{RetrievalError, RetrieveResult};
use crate::vector::types::{SearchHits, VectorDimension, squared_l2};

/// Current index format version.
const INDEX_VERSION: u32 = 1;

/// Size of the index header in bytes.
const HEADER_SIZE: usize = 20;

/// Magic bytes to identify index files.
const MAGIC_BYTES: &[u8; 4] = b"SCIX";

/// Number of bytes per f32 value.
const BYTES_PER_F32: usize = 4;

/// Number of bytes per partition id (u32).
const BYTES_PER_ID: usize = 4;

/// Default number of partitions searched per query.
pub const DEFAULT_NPROBE: usize = 8;

/// Errors raised while reading or writing an index file.
#[derive(Error, Debug)]
pub enum IndexFileError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid index format: {0}")]
    InvalidFormat(String),

    #[error("Unsupported index version: expected {expected}, got {actual}")]
    VersionMismatch { expected: u32, actual: u32 },
}

/// Search interface over a static set of corpus embeddings.
///
/// Implementations are immutable after construction and safe to share
/// between threads without locking.
pub trait VectorIndex: Send + Sync {
    /// Dimension every query vector must have.
    fn dimension(&self) -> VectorDimension;

    /// Number of indexed vectors (the corpus size).
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of inverted-list partitions, 0 for a flat index.
    fn partition_count(&self) -> usize {
        0
    }

    /// Finds the `top_k` nearest vectors to `query`.
    ///
    /// # Errors
    /// Returns `DimensionMismatch` if `query` has the wrong length.
    fn search(&self, query: &[f32], top_k: usize) -> RetrieveResult<SearchHits>;
}

/// Precomputed partitioning written alongside the vectors.
#[derive(Debug, Clone, Default)]
pub struct IvfPartitions {
    /// One centroid per partition.
    pub centroids: Vec<Vec<f32>>,
    /// Partition id of each vector, in corpus order.
    pub assignments: Vec<u32>,
}

/// IVF-flat index backed by a memory-mapped file.
#[derive(Debug)]
pub struct IvfFlatIndex {
    path: PathBuf,
    mmap: Mmap,
    dimension: VectorDimension,
    vector_count: usize,
    /// Byte offset of the vector section.
    vectors_offset: usize,
    centroids: Vec<Vec<f32>>,
    /// Member positions of each partition, ascending.
    partitions: Vec<Vec<u32>>,
    nprobe: usize,
}

impl IvfFlatIndex {
    /// Opens an index file and validates its layout.
    ///
    /// # Errors
    /// Returns `IndexUnavailable` if the file is missing, truncated,
    /// or not an index of a supported version.
    pub fn open(path: impl AsRef<Path>, nprobe: usize) -> RetrieveResult<Self> {
        let path = path.as_ref();
        Self::open_inner(path, nprobe).map_err(|e| RetrievalError::IndexUnavailable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    fn open_inner(path: &Path, nprobe: usize) -> Result<Self, IndexFileError> {
        let file = File::open(path)?;
        // The file is treated as immutable for the lifetime of the map
        let mmap = unsafe { MmapOptions::new().map(&file)? };

        let (dimension, vector_count, nlist) = Self::read_header(&mmap)?;
        let dim = dimension.get();

        let (assignments_offset, vectors_offset, expected_len) =
            Self::layout(dim, vector_count, nlist).ok_or_else(|| {
                IndexFileError::InvalidFormat(format!(
                    "header sizes overflow: {vector_count} vectors of dimension {dim} \
                     and {nlist} partitions"
                ))
            })?;
        let centroids_offset = HEADER_SIZE;

        if mmap.len() != expected_len {
            return Err(IndexFileError::InvalidFormat(format!(
                "expected {expected_len} bytes for {vector_count} vectors of dimension {dim} \
                 and {nlist} partitions, found {}",
                mmap.len()
            )));
        }

        let row_size = dim * BYTES_PER_F32;
        let centroids: Vec<Vec<f32>> = mmap[centroids_offset..assignments_offset]
            .chunks_exact(row_size)
            .map(decode_f32s)
            .collect();

        let mut partitions = vec![Vec::new(); nlist];
        if nlist > 0 {
            for (position, chunk) in mmap[assignments_offset..vectors_offset]
                .chunks_exact(BYTES_PER_ID)
                .enumerate()
            {
                let partition =
                    u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as usize;
                let members = partitions.get_mut(partition).ok_or_else(|| {
                    IndexFileError::InvalidFormat(format!(
                        "vector {position} assigned to partition {partition}, but only {nlist} exist"
                    ))
                })?;
                members.push(position as u32);
            }
        }

        tracing::info!(
            path = %path.display(),
            dimension = dim,
            vectors = vector_count,
            partitions = nlist,
            "opened vector index"
        );

        Ok(Self {
            path: path.to_path_buf(),
            mmap,
            dimension,
            vector_count,
            vectors_offset,
            centroids,
            partitions,
            nprobe: nprobe.max(1),
        })
    }

    /// Section offsets and total file size implied by the header.
    ///
    /// Returns `None` when the header values overflow `usize`.
    fn layout(dim: usize, vector_count: usize, nlist: usize) -> Option<(usize, usize, usize)> {
        let row_size = dim.checked_mul(BYTES_PER_F32)?;
        let assignments_offset = HEADER_SIZE.checked_add(nlist.checked_mul(row_size)?)?;
        let vectors_offset = if nlist > 0 {
            assignments_offset.checked_add(vector_count.checked_mul(BYTES_PER_ID)?)?
        } else {
            assignments_offset
        };
        let expected_len = vectors_offset.checked_add(vector_count.checked_mul(row_size)?)?;
        Some((assignments_offset, vectors_offset, expected_len))
    }

    /// Writes an index file from precomputed vectors and optional partitions.
    ///
    /// No clustering happens here; `partitions` must already assign every
    /// vector to one of its centroids.
    pub fn write(
        path: impl AsRef<Path>,
        dimension: VectorDimension,
        vectors: &[Vec<f32>],
        partitions: Option<&IvfPartitions>,
    ) -> Result<(), IndexFileError> {
        let dim = dimension.get();
        let check_dim = |v: &[f32], what: &str| {
            if v.len() == dim {
                Ok(())
            } else {
                Err(IndexFileError::InvalidFormat(format!(
                    "{what} has dimension {}, expected {dim}",
                    v.len()
                )))
            }
        };

        for vector in vectors {
            check_dim(vector, "vector")?;
        }
        let nlist = partitions.map_or(0, |p| p.centroids.len());
        if let Some(p) = partitions {
            for centroid in &p.centroids {
                check_dim(centroid, "centroid")?;
            }
            if p.assignments.len() != vectors.len() {
                return Err(IndexFileError::InvalidFormat(format!(
                    "{} partition assignments for {} vectors",
                    p.assignments.len(),
                    vectors.len()
                )));
            }
            if let Some(bad) = p.assignments.iter().find(|&&a| a as usize >= nlist) {
                return Err(IndexFileError::InvalidFormat(format!(
                    "assignment to partition {bad} but only {nlist} centroids"
                )));
            }
        }

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = BufWriter::new(File::create(path.as_ref())?);

        out.write_all(MAGIC_BYTES)?;
        out.write_all(&INDEX_VERSION.to_le_bytes())?;
        out.write_all(&(dim as u32).to_le_bytes())?;
        out.write_all(&(vectors.len() as u32).to_le_bytes())?;
        out.write_all(&(nlist as u32).to_le_bytes())?;

        if let Some(p) = partitions {
            for value in p.centroids.iter().flatten() {
                out.write_all(&value.to_le_bytes())?;
            }
            for assignment in &p.assignments {
                out.write_all(&assignment.to_le_bytes())?;
            }
        }
        for value in vectors.iter().flatten() {
            out.write_all(&value.to_le_bytes())?;
        }

        out.flush()?;
        Ok(())
    }

    /// Overrides the number of partitions searched per query.
    #[must_use]
    pub fn with_nprobe(mut self, nprobe: usize) -> Self {
        self.nprobe = nprobe.max(1);
        self
    }

    #[must_use]
    pub fn nprobe(&self) -> usize {
        self.nprobe
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decodes the stored vector for a corpus position.
    #[must_use]
    pub fn vector(&self, position: usize) -> Option<Vec<f32>> {
        (position < self.vector_count).then(|| decode_f32s(self.row_bytes(position)))
    }

    fn row_bytes(&self, position: usize) -> &[u8] {
        let row_size = self.dimension.get() * BYTES_PER_F32;
        let start = self.vectors_offset + position * row_size;
        &self.mmap[start..start + row_size]
    }

    fn distance_to(&self, position: usize, query: &[f32]) -> f32 {
        self.row_bytes(position)
            .chunks_exact(BYTES_PER_F32)
            .zip(query)
            .map(|(bytes, q)| {
                let d = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) - q;
                d * d
            })
            .sum()
    }

    /// Positions to scan for `query`, or `None` to scan everything.
    fn candidates(&self, query: &[f32]) -> Option<Vec<usize>> {
        if self.centroids.is_empty() || self.nprobe >= self.centroids.len() {
            return None;
        }

        let mut ranked: Vec<(usize, f32)> = self
            .centroids
            .iter()
            .enumerate()
            .map(|(i, centroid)| (i, squared_l2(query, centroid)))
            .collect();
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

        let mut positions: Vec<usize> = ranked
            .iter()
            .take(self.nprobe)
            .flat_map(|(partition, _)| self.partitions[*partition].iter().map(|&p| p as usize))
            .collect();
        positions.sort_unstable();
        Some(positions)
    }

    fn read_header(mmap: &Mmap) -> Result<(VectorDimension, usize, usize), IndexFileError> {
        if mmap.len() < HEADER_SIZE {
            return Err(IndexFileError::InvalidFormat(
                "File too small to contain header".to_string(),
            ));
        }

        if &mmap[0..4] != MAGIC_BYTES {
            return Err(IndexFileError::InvalidFormat(
                "Invalid magic bytes".to_string(),
            ));
        }

        let read_u32 =
            |at: usize| u32::from_le_bytes([mmap[at], mmap[at + 1], mmap[at + 2], mmap[at + 3]]);

        let version = read_u32(4);
        if version != INDEX_VERSION {
            return Err(IndexFileError::VersionMismatch {
                expected: INDEX_VERSION,
                actual: version,
            });
        }

        let dimension = VectorDimension::new(read_u32(8) as usize).ok_or_else(|| {
            IndexFileError::InvalidFormat("Vector dimension cannot be zero".to_string())
        })?;
        let vector_count = read_u32(12) as usize;
        let nlist = read_u32(16) as usize;

        Ok((dimension, vector_count, nlist))
    }
}

impl VectorIndex for IvfFlatIndex {
    fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    fn len(&self) -> usize {
        self.vector_count
    }

    fn partition_count(&self) -> usize {
        self.centroids.len()
    }

    fn search(&self, query: &[f32], top_k: usize) -> RetrieveResult<SearchHits> {
        self.dimension.validate_vector(query)?;

        if top_k == 0 {
            return Ok(SearchHits::default());
        }

        let mut ranked: Vec<(usize, f32)> = match self.candidates(query) {
            Some(positions) => positions
                .into_par_iter()
                .map(|p| (p, self.distance_to(p, query)))
                .collect(),
            None => (0..self.vector_count)
                .into_par_iter()
                .map(|p| (p, self.distance_to(p, query)))
                .collect(),
        };

        // Ties break on position so repeated queries order identically
        let by_distance =
            |a: &(usize, f32), b: &(usize, f32)| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0));
        if ranked.len() > top_k {
            ranked.select_nth_unstable_by(top_k - 1, by_distance);
            ranked.truncate(top_k);
        }
        ranked.sort_by(by_distance);

        Ok(SearchHits::from_ranked(ranked, top_k))
    }
}

fn decode_f32s(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(BYTES_PER_F32)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}
