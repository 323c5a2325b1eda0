use crate::split::{split_positives, TrainTestSplit};
use catalog::InteractionLog;
use fastrand::Rng;
use recommender::Recommender;
use shoprec_core::{CoreError, EvaluationOutcome, EvaluationReport, UserEvaluation};
use std::collections::HashSet;
use tracing::{debug, info};

/// Offline precision/recall@K over held-out positives.
///
/// The user grouping is recomputed from the log on every run. The shuffle is
/// driven by the caller's `Rng`, so a fixed seed reproduces a run exactly.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationHarness<'a> {
    recommender: Recommender<'a>,
}

/// A user whose positives could be split, ready to be scored.
#[derive(Debug, Clone)]
pub(crate) struct UserSplit {
    pub user_id: String,
    pub split: TrainTestSplit,
}

impl<'a> EvaluationHarness<'a> {
    pub fn new(recommender: Recommender<'a>) -> Self {
        Self { recommender }
    }

    pub fn recommender(&self) -> &Recommender<'a> {
        &self.recommender
    }

    pub fn evaluate(
        &self,
        log: &InteractionLog,
        k: usize,
        rng: &mut Rng,
    ) -> Result<EvaluationOutcome, CoreError> {
        if k == 0 {
            return Err(CoreError::invalid_input("k must be at least 1"));
        }

        let mut per_user = Vec::new();
        for UserSplit { user_id, split } in self.user_splits(log, rng) {
            let train = self.recommender.catalog().resolve(&split.train)?;
            let ranked = self.recommender.recommend(&user_id, &train, k);
            let evaluation = score_user(
                user_id,
                &split,
                ranked.iter().map(|r| r.product.id.as_str()),
                k,
            );
            debug!(
                "User {}: {} hits out of {} held out",
                evaluation.user_id, evaluation.hits, evaluation.test_size
            );
            per_user.push(evaluation);
        }

        Ok(aggregate(k, per_user))
    }

    /// Splits every user with at least two distinct positives, in first-seen
    /// user order.
    pub(crate) fn user_splits(&self, log: &InteractionLog, rng: &mut Rng) -> Vec<UserSplit> {
        let groups = log.positives_by_user(self.recommender.catalog());
        let total = groups.len();

        let splits: Vec<UserSplit> = groups
            .into_iter()
            .filter_map(|group| {
                split_positives(&group.product_ids, rng).map(|split| UserSplit {
                    user_id: group.user_id,
                    split,
                })
            })
            .collect();

        info!(
            "{} of {} users with positives qualify for evaluation",
            splits.len(),
            total
        );
        splits
    }
}

pub(crate) fn score_user<'i>(
    user_id: String,
    split: &TrainTestSplit,
    returned: impl Iterator<Item = &'i str>,
    denominator: usize,
) -> UserEvaluation {
    let test: HashSet<&str> = split.test.iter().map(String::as_str).collect();
    let hits = returned.filter(|id| test.contains(id)).count();

    UserEvaluation {
        user_id,
        train_size: split.train.len(),
        test_size: split.test.len(),
        hits,
        precision: hits as f64 / denominator as f64,
        recall: hits as f64 / split.test.len() as f64,
    }
}

pub(crate) fn aggregate(k: usize, per_user: Vec<UserEvaluation>) -> EvaluationOutcome {
    if per_user.is_empty() {
        info!("No users qualified, reporting insufficient data");
        return EvaluationOutcome::InsufficientData;
    }

    let users = per_user.len() as f64;
    let precision_at_k = per_user.iter().map(|u| u.precision).sum::<f64>() / users;
    let recall_at_k = per_user.iter().map(|u| u.recall).sum::<f64>() / users;
    info!(
        "Evaluated {} users: precision@{} = {:.4}, recall@{} = {:.4}",
        per_user.len(),
        k,
        precision_at_k,
        k,
        recall_at_k
    );

    EvaluationOutcome::Evaluated(EvaluationReport {
        k,
        users_evaluated: per_user.len(),
        precision_at_k,
        recall_at_k,
        per_user,
    })
}
