//! Type-safe wrappers and core types for vector search.
//!
//! Newtypes here keep dimensions and search output from being passed
//! around as bare integers and parallel vectors.

use crate::error::{RetrievalError, RetrieveResult};

/// Output dimension of the all-MiniLM-L6-v2 sentence model.
pub const VECTOR_DIMENSION_384: usize = 384;

/// Position reported for missing hits when fewer than `top_k` entries exist.
pub const SENTINEL_POSITION: i64 = -1;

/// Distance reported alongside [`SENTINEL_POSITION`].
pub const SENTINEL_DISTANCE: f32 = f32::MAX;

/// Type-safe wrapper for vector dimensions.
///
/// Ensures runtime validation of vector dimensions to prevent
/// dimension mismatches between the embedding model and the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorDimension(usize);

impl VectorDimension {
    /// Creates a new `VectorDimension` with validation.
    ///
    /// Returns `None` if the dimension is zero.
    #[must_use]
    pub fn new(dim: usize) -> Option<Self> {
        (dim > 0).then_some(Self(dim))
    }

    /// Creates a standard 384-dimensional vector dimension.
    #[must_use]
    pub const fn dimension_384() -> Self {
        Self(VECTOR_DIMENSION_384)
    }

    /// Returns the underlying dimension value.
    #[must_use]
    pub const fn get(&self) -> usize {
        self.0
    }

    /// Validates that a vector has the expected dimension.
    pub fn validate_vector(&self, vector: &[f32]) -> RetrieveResult<()> {
        if vector.len() != self.0 {
            return Err(RetrievalError::DimensionMismatch {
                expected: self.0,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for VectorDimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raw output of a k-nearest-neighbor search.
///
/// Two parallel sequences of length `top_k`, ordered by ascending distance.
/// Slots beyond the number of indexed vectors hold [`SENTINEL_POSITION`]
/// and [`SENTINEL_DISTANCE`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchHits {
    pub distances: Vec<f32>,
    pub positions: Vec<i64>,
}

impl SearchHits {
    /// Builds hits from `(position, distance)` pairs already sorted ascending,
    /// padding with sentinels up to `top_k`.
    #[must_use]
    pub fn from_ranked(ranked: Vec<(usize, f32)>, top_k: usize) -> Self {
        let capacity = top_k.min(ranked.len());
        let mut distances = Vec::with_capacity(capacity);
        let mut positions = Vec::with_capacity(capacity);

        for (position, distance) in ranked.into_iter().take(top_k) {
            positions.push(position as i64);
            distances.push(distance);
        }
        while positions.len() < top_k {
            positions.push(SENTINEL_POSITION);
            distances.push(SENTINEL_DISTANCE);
        }

        Self {
            distances,
            positions,
        }
    }

    /// Number of slots, including sentinel padding.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Iterates `(distance, position)` pairs in rank order.
    pub fn iter(&self) -> impl Iterator<Item = (f32, i64)> + '_ {
        self.distances
            .iter()
            .copied()
            .zip(self.positions.iter().copied())
    }
}

/// Squared Euclidean distance between two vectors of equal length.
#[inline]
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "Vectors must have same dimension");

    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Scales a vector to unit length in place. Zero vectors are left untouched.
pub fn normalize_vector(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}
