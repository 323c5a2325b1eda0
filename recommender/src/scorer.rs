use embedding_engine::{centroid, cosine_similarity, EmbeddingIndex};
use shoprec_core::Product;
use std::collections::HashSet;

/// Weight of the vector term relative to one unit of tag/category overlap.
pub const VECTOR_WEIGHT: f64 = 2.0;

/// Discrete overlap between a candidate and a set of liked products:
/// shared distinct tags, plus one if the category was liked before.
pub fn content_score(candidate: &Product, liked: &[&Product]) -> f64 {
    UserProfile::from_liked(liked, None).content_score(candidate)
}

/// What a user is known to like, computed once per request.
#[derive(Debug, Clone)]
pub struct UserProfile<'p> {
    liked_tags: HashSet<&'p str>,
    liked_categories: HashSet<&'p str>,
    embedding: Option<Vec<f32>>,
    liked_count: usize,
}

impl<'p> UserProfile<'p> {
    fn from_liked(liked: &[&'p Product], embedding: Option<Vec<f32>>) -> Self {
        Self {
            liked_tags: liked
                .iter()
                .flat_map(|p| p.tags.iter().map(String::as_str))
                .collect(),
            liked_categories: liked.iter().map(|p| p.category.as_str()).collect(),
            embedding,
            liked_count: liked.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.liked_count == 0
    }

    pub fn embedding(&self) -> Option<&[f32]> {
        self.embedding.as_deref()
    }

    pub fn content_score(&self, candidate: &Product) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let overlap = candidate
            .tags
            .iter()
            .map(String::as_str)
            .collect::<HashSet<_>>()
            .intersection(&self.liked_tags)
            .count();
        let category_bonus = usize::from(self.liked_categories.contains(candidate.category.as_str()));
        (overlap + category_bonus) as f64
    }
}

/// Hybrid content + vector scorer over a shared, read-only index.
#[derive(Debug, Clone, Copy)]
pub struct Scorer<'a> {
    index: &'a EmbeddingIndex,
}

impl<'a> Scorer<'a> {
    pub fn new(index: &'a EmbeddingIndex) -> Self {
        Self { index }
    }

    pub fn index(&self) -> &'a EmbeddingIndex {
        self.index
    }

    /// Centroid of the liked products that have an embedding.
    pub fn user_embedding(&self, liked: &[&Product]) -> Option<Vec<f32>> {
        centroid(liked.iter().filter_map(|p| self.index.embedding_of(&p.id)))
    }

    pub fn profile<'p>(&self, liked: &[&'p Product]) -> UserProfile<'p> {
        UserProfile::from_liked(liked, self.user_embedding(liked))
    }

    /// `content + VECTOR_WEIGHT * cosine(user, candidate)`. A missing user or
    /// candidate embedding contributes 0 rather than failing.
    pub fn hybrid_score(&self, candidate: &Product, profile: &UserProfile<'_>) -> f64 {
        let vector_score = match (profile.embedding(), self.index.embedding_of(&candidate.id)) {
            (Some(user), Some(item)) => f64::from(cosine_similarity(user, item)),
            _ => 0.0,
        };
        profile.content_score(candidate) + VECTOR_WEIGHT * vector_score
    }
}
