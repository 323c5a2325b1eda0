use catalog::Catalog;
use embedding_engine::{cosine_similarity, EmbeddingIndex};
use shoprec_core::{CoreError, SimilarProduct};
use tracing::debug;

/// Product-to-product nearest neighbours by cosine similarity.
#[derive(Debug, Clone, Copy)]
pub struct SimilarItems<'a> {
    catalog: &'a Catalog,
    index: &'a EmbeddingIndex,
}

impl<'a> SimilarItems<'a> {
    pub fn new(catalog: &'a Catalog, index: &'a EmbeddingIndex) -> Self {
        Self { catalog, index }
    }

    pub fn similar(&self, product_id: &str, k: usize) -> Result<Vec<SimilarProduct<'a>>, CoreError> {
        if !self.catalog.contains(product_id) {
            return Err(CoreError::product_not_found(product_id));
        }
        let base = self
            .index
            .embedding_of(product_id)
            .ok_or_else(|| CoreError::NotFound {
                resource: format!("embedding for product {product_id}"),
            })?;

        let mut scored: Vec<SimilarProduct<'a>> = self
            .catalog
            .products()
            .iter()
            .filter(|p| p.id != product_id)
            .filter_map(|product| {
                self.index
                    .embedding_of(&product.id)
                    .map(|embedding| SimilarProduct {
                        product,
                        similarity: cosine_similarity(base, embedding),
                    })
            })
            .collect();

        scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        scored.truncate(k);

        debug!("Found {} neighbours for product {}", scored.len(), product_id);
        Ok(scored)
    }
}
