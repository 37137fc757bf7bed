//! PaperDigest search
//!
//! Per-paper vector indexes and multi-paper retrieval:
//! - [`index`]: exact nearest-neighbour primitive
//! - [`store`]: keyed store of one index per paper
//! - [`retrieval`]: cross-paper search with a global merge

pub mod index;
pub mod retrieval;
pub mod store;

pub use index::{FlatL2Index, VectorIndex};
pub use retrieval::RetrievalCoordinator;
pub use store::{IndexHit, IndexStore, PaperIndex};
