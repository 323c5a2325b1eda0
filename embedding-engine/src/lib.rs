//! Deterministic product embeddings and the vector math built on them.

pub mod index;
pub mod math;

pub use index::{EmbeddingIndex, NumericRange, TOP_TAGS};
pub use math::{centroid, cosine_similarity, normalize};
