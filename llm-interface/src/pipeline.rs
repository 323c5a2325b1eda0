use crate::merge::merge_reranked;
use crate::{whole_seconds, Reranker};
use catalog::InteractionLog;
use recommender::Recommender;
use shoprec_core::{CoreError, ExplainedRecommendation, Product, UpstreamError};
use std::future::{pending, Future};
use std::time::{Duration, Instant};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// Number of baseline recommendations offered to the re-ranker.
pub const DEFAULT_CANDIDATE_POOL: usize = 6;

/// Deadline for one re-rank call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Baseline ranking followed by an LLM re-rank of the top candidates.
///
/// Each call is independent: no retries, no shared queue. A failed or
/// timed-out call returns an error for that request only.
pub struct RerankPipeline<'a, R> {
    recommender: Recommender<'a>,
    reranker: R,
    candidate_pool: usize,
    timeout: Duration,
}

impl<'a, R: Reranker> RerankPipeline<'a, R> {
    pub fn new(recommender: Recommender<'a>, reranker: R) -> Self {
        Self {
            recommender,
            reranker,
            candidate_pool: DEFAULT_CANDIDATE_POOL,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_candidate_pool(mut self, candidate_pool: usize) -> Self {
        self.candidate_pool = candidate_pool;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn recommender(&self) -> &Recommender<'a> {
        &self.recommender
    }

    pub async fn recommend(
        &self,
        user_id: &str,
        liked: &[&Product],
        k: usize,
    ) -> Result<Vec<ExplainedRecommendation<'a>>, CoreError> {
        self.recommend_until(user_id, liked, k, pending()).await
    }

    pub async fn recommend_for_user(
        &self,
        user_id: &str,
        log: &InteractionLog,
        k: usize,
    ) -> Result<Vec<ExplainedRecommendation<'a>>, CoreError> {
        let liked = log.liked_products(user_id, self.recommender.catalog());
        self.recommend(user_id, &liked, k).await
    }

    /// Like [`recommend`](Self::recommend), but gives up with
    /// [`UpstreamError::Cancelled`] as soon as `cancel` resolves.
    pub async fn recommend_until<C>(
        &self,
        user_id: &str,
        liked: &[&Product],
        k: usize,
        cancel: C,
    ) -> Result<Vec<ExplainedRecommendation<'a>>, CoreError>
    where
        C: Future<Output = ()>,
    {
        let request_id = Uuid::new_v4();
        let span = info_span!("rerank", %request_id, user_id);
        self.rerank_candidates(user_id, liked, k, cancel)
            .instrument(span)
            .await
    }

    async fn rerank_candidates<C>(
        &self,
        user_id: &str,
        liked: &[&Product],
        k: usize,
        cancel: C,
    ) -> Result<Vec<ExplainedRecommendation<'a>>, CoreError>
    where
        C: Future<Output = ()>,
    {
        let candidates: Vec<&'a Product> = self
            .recommender
            .recommend(user_id, liked, self.candidate_pool)
            .into_iter()
            .map(|r| r.product)
            .collect();
        if candidates.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let start_time = Instant::now();
        let call = tokio::time::timeout(self.timeout, self.reranker.rerank(&candidates, liked, k));

        let decisions = tokio::select! {
            outcome = call => match outcome {
                Ok(result) => result,
                Err(_) => Err(CoreError::Timeout {
                    seconds: whole_seconds(self.timeout),
                }),
            },
            _ = cancel => Err(UpstreamError::Cancelled.into()),
        };

        let decisions = decisions.map_err(|e| {
            warn!("Re-rank failed after {:?}: {}", start_time.elapsed(), e);
            e
        })?;

        let merged = merge_reranked(&candidates, decisions, k);
        info!(
            "Re-ranked {} candidates into {} recommendations in {:?}",
            candidates.len(),
            merged.len(),
            start_time.elapsed()
        );
        Ok(merged)
    }
}
