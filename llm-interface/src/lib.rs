//! Optional LLM re-ranking of baseline recommendations.
//!
//! The language model is an external collaborator reached through the
//! [`Reranker`] capability. Whatever it answers is treated as untrusted: ids
//! are checked against the candidates that were offered, the list is cut to
//! `k`, and every failure stays scoped to the request that caused it.

use shoprec_core::{CoreError, Product, RerankDecision};
use std::time::Duration;

pub mod merge;
pub mod ollama;
pub mod pipeline;
pub mod prompt;

pub use merge::merge_reranked;
pub use ollama::OllamaReranker;
pub use pipeline::{RerankPipeline, DEFAULT_CANDIDATE_POOL, DEFAULT_TIMEOUT};
pub use prompt::build_prompt;

pub trait Reranker {
    /// Re-orders `candidates` for a user with the given `history`, returning
    /// at most `k` ids with a one-sentence reason each.
    async fn rerank(
        &self,
        candidates: &[&Product],
        history: &[&Product],
        k: usize,
    ) -> Result<Vec<RerankDecision>, CoreError>;
}

impl<R: Reranker> Reranker for &R {
    async fn rerank(
        &self,
        candidates: &[&Product],
        history: &[&Product],
        k: usize,
    ) -> Result<Vec<RerankDecision>, CoreError> {
        (**self).rerank(candidates, history, k).await
    }
}

/// Rounds up so a sub-second deadline is never reported as "0 seconds".
pub(crate) fn whole_seconds(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}
