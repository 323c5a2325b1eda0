//! Hybrid content + vector recommendations over an immutable [`EmbeddingIndex`].
//!
//! The index is built once by the caller and injected by reference into the
//! [`Scorer`], [`Recommender`] and [`SimilarItems`]; nothing here holds
//! global state.
//!
//! [`EmbeddingIndex`]: embedding_engine::EmbeddingIndex

pub mod ranking;
pub mod scorer;
pub mod similar;

pub use ranking::Recommender;
pub use scorer::{content_score, Scorer, UserProfile, VECTOR_WEIGHT};
pub use similar::SimilarItems;
