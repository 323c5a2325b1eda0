use crate::scorer::Scorer;
use catalog::{Catalog, InteractionLog};
use embedding_engine::EmbeddingIndex;
use shoprec_core::{CoreError, Product, Recommendation};
use std::collections::HashSet;
use tracing::debug;

/// Top-K hybrid ranking over the whole catalog.
#[derive(Debug, Clone, Copy)]
pub struct Recommender<'a> {
    catalog: &'a Catalog,
    scorer: Scorer<'a>,
}

impl<'a> Recommender<'a> {
    pub fn new(catalog: &'a Catalog, index: &'a EmbeddingIndex) -> Self {
        Self {
            catalog,
            scorer: Scorer::new(index),
        }
    }

    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    pub fn scorer(&self) -> &Scorer<'a> {
        &self.scorer
    }

    /// Ranks every catalog product the user has not already liked.
    ///
    /// Without any liked products this returns the first `k` products in
    /// storage order with a score of 0. That fallback is positional only; it
    /// is not a popularity ranking.
    pub fn recommend(&self, user_id: &str, liked: &[&Product], k: usize) -> Vec<Recommendation<'a>> {
        if liked.is_empty() {
            debug!("No history for user {}, returning first {} catalog products", user_id, k);
            return self
                .catalog
                .products()
                .iter()
                .take(k)
                .map(|product| Recommendation { product, score: 0.0 })
                .collect();
        }

        let excluded: HashSet<&str> = liked.iter().map(|p| p.id.as_str()).collect();
        let profile = self.scorer.profile(liked);

        let mut scored: Vec<Recommendation<'a>> = self
            .catalog
            .products()
            .iter()
            .filter(|p| !excluded.contains(p.id.as_str()))
            .map(|product| Recommendation {
                product,
                score: self.scorer.hybrid_score(product, &profile),
            })
            .collect();

        debug!(
            "Scored {} candidates for user {} ({} liked, {} excluded)",
            scored.len(),
            user_id,
            liked.len(),
            excluded.len()
        );

        // sort_by is stable, so equal scores keep catalog order
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        scored
    }

    /// Same as [`recommend`](Self::recommend) with liked products given by id.
    pub fn recommend_by_ids<S: AsRef<str>>(
        &self,
        user_id: &str,
        liked_ids: &[S],
        k: usize,
    ) -> Result<Vec<Recommendation<'a>>, CoreError> {
        let liked = self.catalog.resolve(liked_ids)?;
        Ok(self.recommend(user_id, &liked, k))
    }

    /// Profiles the user from their positive interactions in `log`.
    pub fn recommend_for_user(
        &self,
        user_id: &str,
        log: &InteractionLog,
        k: usize,
    ) -> Vec<Recommendation<'a>> {
        let liked = log.liked_products(user_id, self.catalog);
        self.recommend(user_id, &liked, k)
    }
}
