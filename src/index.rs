//! Exact nearest-neighbor index over chunk embeddings.
//!
//! Stores one dense vector per chunk and answers queries with a brute-force
//! linear scan ranked by squared Euclidean distance. At this corpus scale
//! (tens to low hundreds of chunks) an exact scan beats tuning an
//! approximate index, and it keeps results fully deterministic: ties in
//! distance are broken by ascending chunk id.

use anyhow::{bail, Result};

use crate::models::SearchHit;

/// Immutable collection of chunk embeddings, searchable by distance.
///
/// Vector `i` belongs to chunk id `i`; callers keep the chunk list and the
/// index together (see [`KnowledgeBase`](crate::kb::KnowledgeBase)) so ids
/// never drift out of alignment.
#[derive(Debug)]
pub struct VectorIndex {
    dims: usize,
    vectors: Vec<Vec<f32>>,
}

impl VectorIndex {
    /// Build an index from one embedding per chunk, in chunk-id order.
    ///
    /// # Errors
    ///
    /// Fails on an empty input, and on any vector whose dimension differs
    /// from the first — all vectors in one index must come from the same
    /// embedding model.
    pub fn build(vectors: Vec<Vec<f32>>) -> Result<Self> {
        let dims = match vectors.first() {
            Some(v) => v.len(),
            None => bail!("cannot build a vector index from zero vectors"),
        };
        if dims == 0 {
            bail!("cannot build a vector index from zero-dimension vectors");
        }
        for (i, v) in vectors.iter().enumerate() {
            if v.len() != dims {
                bail!(
                    "embedding dimension mismatch at chunk {}: expected {}, got {}",
                    i,
                    dims,
                    v.len()
                );
            }
        }
        Ok(Self { dims, vectors })
    }

    /// Embedding dimensionality shared by every vector in the index.
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Number of indexed vectors.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Return up to `k` chunk ids ascending by squared L2 distance to `query`.
    ///
    /// Always returns exactly `min(k, len)` hits. Equal distances are ordered
    /// by ascending chunk id so repeated searches are reproducible.
    ///
    /// # Errors
    ///
    /// Fails when `query` has a different dimension than the index — that
    /// means the query was embedded with a different model than the corpus,
    /// which is a bug in the caller, not a recoverable condition.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if query.len() != self.dims {
            bail!(
                "query dimension mismatch: index has {} dims, query has {}",
                self.dims,
                query.len()
            );
        }

        let mut hits: Vec<SearchHit> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(chunk_id, v)| SearchHit {
                chunk_id,
                distance: squared_l2(query, v),
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.chunk_id.cmp(&b.chunk_id))
        });
        hits.truncate(k);
        Ok(hits)
    }
}

/// Squared Euclidean distance between two equal-length vectors.
fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_empty_fails() {
        let err = VectorIndex::build(Vec::new()).unwrap_err();
        assert!(err.to_string().contains("zero vectors"));
    }

    #[test]
    fn test_build_mixed_dims_fails() {
        let err = VectorIndex::build(vec![vec![1.0, 2.0], vec![1.0]]).unwrap_err();
        assert!(err.to_string().contains("dimension mismatch"));
    }

    #[test]
    fn test_search_dimension_mismatch_fails() {
        let index = VectorIndex::build(vec![vec![0.0, 0.0]]).unwrap();
        let err = index.search(&[1.0, 2.0, 3.0], 1).unwrap_err();
        assert!(err.to_string().contains("query dimension mismatch"));
    }

    #[test]
    fn test_search_returns_min_k_len() {
        let index = VectorIndex::build(vec![vec![0.0], vec![1.0], vec![2.0]]).unwrap();
        assert_eq!(index.search(&[0.0], 2).unwrap().len(), 2);
        assert_eq!(index.search(&[0.0], 10).unwrap().len(), 3);
        assert_eq!(index.search(&[0.0], 0).unwrap().len(), 0);
    }

    #[test]
    fn test_search_ascending_distance() {
        let index =
            VectorIndex::build(vec![vec![5.0, 0.0], vec![1.0, 0.0], vec![3.0, 0.0]]).unwrap();
        let hits = index.search(&[0.0, 0.0], 3).unwrap();
        assert_eq!(
            hits.iter().map(|h| h.chunk_id).collect::<Vec<_>>(),
            vec![1, 2, 0]
        );
        for pair in hits.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
    }

    #[test]
    fn test_exact_match_distance_zero() {
        let index = VectorIndex::build(vec![vec![0.5, -1.5], vec![2.0, 2.0]]).unwrap();
        let hits = index.search(&[0.5, -1.5], 1).unwrap();
        assert_eq!(hits[0].chunk_id, 0);
        assert!(hits[0].distance.abs() < 1e-6);
    }

    #[test]
    fn test_ties_break_by_chunk_id() {
        let index =
            VectorIndex::build(vec![vec![1.0, 0.0], vec![-1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        let hits = index.search(&[0.0, 0.0], 3).unwrap();
        // All three are at squared distance 1 from the origin.
        assert_eq!(
            hits.iter().map(|h| h.chunk_id).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }
}
