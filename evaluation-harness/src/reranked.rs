use crate::harness::{aggregate, score_user, EvaluationHarness, UserSplit};
use catalog::InteractionLog;
use fastrand::Rng;
use llm_interface::{RerankPipeline, Reranker};
use shoprec_core::{CoreError, ErrorExt, EvaluationOutcome, RerankerConfig};
use std::time::Duration;
use tracing::{info, warn};

/// Limits for evaluating through a live re-ranker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RerankEvaluationOptions {
    /// Stop after this many users produced a usable answer.
    pub max_users: usize,
    /// Wait after a scored user before the next re-rank request.
    pub pause: Duration,
}

impl Default for RerankEvaluationOptions {
    fn default() -> Self {
        Self::from(&RerankerConfig::default())
    }
}

impl From<&RerankerConfig> for RerankEvaluationOptions {
    fn from(config: &RerankerConfig) -> Self {
        Self {
            max_users: config.evaluation_max_users,
            pause: config.evaluation_pause(),
        }
    }
}

impl<'a> EvaluationHarness<'a> {
    /// Same protocol as [`evaluate`](Self::evaluate), with the pipeline's
    /// explained recommendations in place of the baseline ranking.
    ///
    /// Precision is taken over what the re-ranker actually returned. Users
    /// whose request fails or comes back empty are skipped.
    pub async fn evaluate_reranked<R: Reranker>(
        &self,
        pipeline: &RerankPipeline<'a, R>,
        log: &InteractionLog,
        k: usize,
        options: RerankEvaluationOptions,
        rng: &mut Rng,
    ) -> Result<EvaluationOutcome, CoreError> {
        if k == 0 {
            return Err(CoreError::invalid_input("k must be at least 1"));
        }

        let mut per_user = Vec::new();
        let mut attempted = 0usize;
        let mut pause_pending = false;

        for UserSplit { user_id, split } in self.user_splits(log, rng) {
            if per_user.len() >= options.max_users {
                info!("Reached the limit of {} re-ranked users", options.max_users);
                break;
            }
            // only a scored user earns the next one a pause
            if std::mem::take(&mut pause_pending) && !options.pause.is_zero() {
                tokio::time::sleep(options.pause).await;
            }
            attempted += 1;

            let train = self.recommender().catalog().resolve(&split.train)?;
            let explained = match pipeline.recommend(&user_id, &train, k).await {
                Ok(explained) => explained,
                Err(e) => {
                    e.log_warn();
                    warn!("Skipping user {} after re-rank failure", user_id);
                    continue;
                }
            };
            if explained.is_empty() {
                warn!("Re-ranker returned nothing for user {}, skipping", user_id);
                continue;
            }

            let returned = explained.len();
            per_user.push(score_user(
                user_id,
                &split,
                explained.iter().map(|e| e.product.id.as_str()),
                returned,
            ));
            pause_pending = true;
        }

        info!(
            "Re-ranked evaluation attempted {} users, scored {}",
            attempted,
            per_user.len()
        );
        Ok(aggregate(k, per_user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_follow_config() {
        let config = RerankerConfig {
            evaluation_max_users: 3,
            evaluation_pause_ms: 250,
            ..RerankerConfig::default()
        };
        let options = RerankEvaluationOptions::from(&config);
        assert_eq!(options.max_users, 3);
        assert_eq!(options.pause, Duration::from_millis(250));
    }

    #[test]
    fn test_default_options() {
        let options = RerankEvaluationOptions::default();
        assert_eq!(options.max_users, 5);
        assert_eq!(options.pause, Duration::from_millis(1500));
    }
}
