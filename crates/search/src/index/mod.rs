//! Nearest-neighbour search primitive
//!
//! An index is built once from a set of vectors and answers k-NN queries
//! with positions into that set. Distances follow the "lower is closer"
//! convention throughout the crate.

mod flat;

pub use flat::FlatL2Index;

use paperdigest_common::errors::Result;

/// A built, immutable nearest-neighbour index
pub trait VectorIndex: Send + Sync {
    /// Vector dimension accepted by [`VectorIndex::search`]
    fn dimension(&self) -> usize;

    /// Number of indexed vectors
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return up to `k` `(position, distance)` pairs, ascending by distance.
    /// Equal distances keep insertion order.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>>;
}

/// Constructor used by the index store to turn embeddings into an index
pub type IndexBuilder = fn(Vec<Vec<f32>>) -> Result<Box<dyn VectorIndex>>;

/// Default [`IndexBuilder`]: exact search over all vectors
pub fn build_flat_index(vectors: Vec<Vec<f32>>) -> Result<Box<dyn VectorIndex>> {
    Ok(Box::new(FlatL2Index::build(vectors)?))
}
