//! Core data types shared across the pipeline.

/// A contiguous window of the corpus text, the unit of retrieval.
///
/// Offsets are character offsets into the corpus. Chunk ids are assigned in
/// creation order starting at 0 and double as positions in the vector index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub id: usize,
    pub text: String,
    pub start_offset: usize,
    pub end_offset: usize,
}

/// A single nearest-neighbor match from the vector index.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// Id of the matched chunk.
    pub chunk_id: usize,
    /// Squared Euclidean distance to the query vector (smaller is closer).
    pub distance: f32,
}
