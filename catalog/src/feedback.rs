use shoprec_core::{ExplanationFeedback, FeedbackStats, ModelFeedback};
use tracing::debug;

/// Helpfulness of explanations per model. Entries for any model other than
/// `baseline` or `llm` are ignored.
pub fn feedback_stats(entries: &[ExplanationFeedback]) -> FeedbackStats {
    let mut stats = FeedbackStats::default();
    let mut ignored = 0usize;

    for entry in entries {
        let model = match entry.model.as_str() {
            "baseline" => &mut stats.baseline,
            "llm" => &mut stats.llm,
            _ => {
                ignored += 1;
                continue;
            }
        };
        model.total += 1;
        if entry.helpful {
            model.helpful += 1;
        }
    }

    if ignored > 0 {
        debug!("Ignored {} feedback entries for unknown models", ignored);
    }
    for model in [&mut stats.baseline, &mut stats.llm] {
        model.helpful_rate = rate(model);
    }
    stats
}

fn rate(model: &ModelFeedback) -> Option<f64> {
    (model.total > 0).then(|| model.helpful as f64 / model.total as f64)
}
