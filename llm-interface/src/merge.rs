use shoprec_core::{ExplainedRecommendation, Product, RerankDecision};
use std::collections::HashSet;
use tracing::warn;

/// Validates a re-ranker answer against the candidates that were offered.
///
/// Ids that were never offered are dropped, repeated ids keep their first
/// occurrence, and the result is cut to `k`. Surviving ids are re-hydrated to
/// the full candidate product with the reason attached as explanation.
pub fn merge_reranked<'a>(
    candidates: &[&'a Product],
    decisions: Vec<RerankDecision>,
    k: usize,
) -> Vec<ExplainedRecommendation<'a>> {
    let mut emitted: HashSet<String> = HashSet::new();
    let mut merged = Vec::with_capacity(k.min(decisions.len()));

    for decision in decisions {
        if merged.len() == k {
            break;
        }
        let Some(product) = candidates.iter().copied().find(|p| p.id == decision.id) else {
            warn!("Discarding re-ranked id {} that was not among the candidates", decision.id);
            continue;
        };
        if !emitted.insert(decision.id) {
            continue;
        }
        merged.push(ExplainedRecommendation {
            product,
            explanation: decision.reason,
        });
    }

    merged
}
