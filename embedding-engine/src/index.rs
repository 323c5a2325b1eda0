use crate::math::normalize;
use shoprec_core::{ConfigError, CoreError, Product};
use std::collections::HashMap;
use tracing::{debug, info};

/// Number of most frequent tags that get their own dimension.
pub const TOP_TAGS: usize = 50;

/// Fixed feature space derived from one catalog snapshot.
///
/// Layout of every vector: `[tag one-hot | category one-hot | price | rating]`.
/// The index is built once and never mutated, so it can be shared freely
/// between threads by reference.
#[derive(Debug, Clone)]
pub struct EmbeddingIndex {
    tag_vocabulary: Vec<String>,
    tag_slots: HashMap<String, usize>,
    category_vocabulary: Vec<String>,
    category_slots: HashMap<String, usize>,
    price_range: NumericRange,
    rating_range: NumericRange,
    embeddings: HashMap<String, Vec<f32>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
}

impl NumericRange {
    fn observe<I: Iterator<Item = f64>>(values: I) -> Self {
        values
            .filter(|v| v.is_finite())
            .fold(
                NumericRange {
                    min: f64::INFINITY,
                    max: f64::NEG_INFINITY,
                },
                |range, v| NumericRange {
                    min: range.min.min(v),
                    max: range.max.max(v),
                },
            )
    }

    fn scale(&self, value: f64) -> f64 {
        normalize(value, self.min, self.max)
    }
}

impl EmbeddingIndex {
    pub fn build(products: &[Product]) -> Result<Self, CoreError> {
        if products.is_empty() {
            return Err(ConfigError::EmptyCatalog.into());
        }

        let tag_vocabulary = top_tags(products, TOP_TAGS);
        let tag_slots = slots(&tag_vocabulary);

        let mut category_vocabulary: Vec<String> = Vec::new();
        for product in products {
            if !category_vocabulary.contains(&product.category) {
                category_vocabulary.push(product.category.clone());
            }
        }
        let category_slots = slots(&category_vocabulary);

        let price_range = NumericRange::observe(products.iter().filter_map(|p| p.price));
        let rating_range = NumericRange::observe(products.iter().filter_map(|p| p.rating));

        let mut index = Self {
            tag_vocabulary,
            tag_slots,
            category_vocabulary,
            category_slots,
            price_range,
            rating_range,
            embeddings: HashMap::with_capacity(products.len()),
        };

        for product in products {
            let embedding = index.encode(product);
            index.embeddings.insert(product.id.clone(), embedding);
        }

        info!(
            "Built embedding index: {} products, {} tag dims, {} category dims, dimension {}",
            products.len(),
            index.tag_vocabulary.len(),
            index.category_vocabulary.len(),
            index.dimension()
        );
        debug!("Tag vocabulary: {:?}", index.tag_vocabulary);

        Ok(index)
    }

    /// Soft lookup: unknown products have no embedding, which is not an error.
    pub fn embedding_of(&self, product_id: &str) -> Option<&[f32]> {
        self.embeddings.get(product_id).map(Vec::as_slice)
    }

    pub fn dimension(&self) -> usize {
        self.tag_vocabulary.len() + self.category_vocabulary.len() + 2
    }

    pub fn tag_vocabulary(&self) -> &[String] {
        &self.tag_vocabulary
    }

    pub fn category_vocabulary(&self) -> &[String] {
        &self.category_vocabulary
    }

    pub fn price_range(&self) -> NumericRange {
        self.price_range
    }

    pub fn rating_range(&self) -> NumericRange {
        self.rating_range
    }

    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }

    fn encode(&self, product: &Product) -> Vec<f32> {
        let tag_dims = self.tag_vocabulary.len();
        let mut vector = vec![0.0f32; self.dimension()];

        for tag in &product.tags {
            if let Some(&slot) = self.tag_slots.get(&tag.to_lowercase()) {
                vector[slot] = 1.0;
            }
        }
        if let Some(&slot) = self.category_slots.get(&product.category) {
            vector[tag_dims + slot] = 1.0;
        }

        // A missing value is scaled as 0, so it can land below the observed minimum.
        let numeric_base = tag_dims + self.category_vocabulary.len();
        vector[numeric_base] = self.price_range.scale(product.price.unwrap_or(0.0)) as f32;
        vector[numeric_base + 1] = self.rating_range.scale(product.rating.unwrap_or(0.0)) as f32;

        vector
    }
}

/// Most frequent lower-cased tags. Equal counts keep first-seen catalog order.
fn top_tags(products: &[Product], limit: usize) -> Vec<String> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut position: HashMap<String, usize> = HashMap::new();

    for tag in products.iter().flat_map(|p| p.tags.iter()) {
        let tag = tag.to_lowercase();
        match position.get(&tag) {
            Some(&i) => counts[i].1 += 1,
            None => {
                position.insert(tag.clone(), counts.len());
                counts.push((tag, 1));
            }
        }
    }

    // stable: ties stay in first-seen order
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(limit);
    counts.into_iter().map(|(tag, _)| tag).collect()
}

fn slots(vocabulary: &[String]) -> HashMap<String, usize> {
    vocabulary
        .iter()
        .enumerate()
        .map(|(i, value)| (value.clone(), i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, category: &str, tags: &[&str], price: Option<f64>, rating: Option<f64>) -> Product {
        Product {
            id: id.to_string(),
            name: id.to_uppercase(),
            category: category.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            price,
            rating,
        }
    }

    #[test]
    fn test_empty_catalog_is_config_error() {
        let result = EmbeddingIndex::build(&[]);
        assert!(matches!(
            result,
            Err(CoreError::Config(ConfigError::EmptyCatalog))
        ));
    }

    #[test]
    fn test_dimension_and_layout() {
        let products = vec![
            product("p1", "X", &["a", "B"], Some(10.0), Some(4.0)),
            product("p2", "X", &["b", "c"], Some(20.0), Some(5.0)),
            product("p3", "Y", &[], None, None),
        ];
        let index = EmbeddingIndex::build(&products).unwrap();

        // b appears twice, then a and c in first-seen order
        assert_eq!(index.tag_vocabulary(), &["b", "a", "c"]);
        assert_eq!(index.category_vocabulary(), &["X", "Y"]);
        assert_eq!(index.dimension(), 3 + 2 + 2);
        assert_eq!(index.price_range(), NumericRange { min: 10.0, max: 20.0 });
        assert_eq!(index.rating_range(), NumericRange { min: 4.0, max: 5.0 });

        for p in &products {
            assert_eq!(index.embedding_of(&p.id).unwrap().len(), index.dimension());
        }

        let p1 = index.embedding_of("p1").unwrap();
        assert_eq!(p1, &[1.0f32, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0]);

        let p2 = index.embedding_of("p2").unwrap();
        assert_eq!(p2, &[1.0f32, 0.0, 1.0, 1.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_non_finite_values_do_not_widen_ranges() {
        let products = vec![
            product("p1", "X", &[], Some(10.0), Some(f64::NAN)),
            product("p2", "X", &[], Some(f64::INFINITY), Some(3.0)),
            product("p3", "X", &[], Some(30.0), None),
        ];
        let index = EmbeddingIndex::build(&products).unwrap();
        assert_eq!(index.price_range(), NumericRange { min: 10.0, max: 30.0 });
        assert_eq!(index.rating_range(), NumericRange { min: 3.0, max: 3.0 });
        for p in &products {
            assert!(index.embedding_of(&p.id).unwrap().iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn test_untagged_product_has_zero_tag_segment() {
        let products = vec![
            product("p1", "X", &["a"], Some(10.0), None),
            product("p2", "Y", &[], Some(30.0), None),
        ];
        let index = EmbeddingIndex::build(&products).unwrap();
        let embedding = index.embedding_of("p2").unwrap();
        assert_eq!(embedding.len(), index.dimension());
        assert!(embedding[..index.tag_vocabulary().len()].iter().all(|&v| v == 0.0));
        assert_eq!(embedding[index.dimension() - 2], 1.0);
    }

    #[test]
    fn test_vocabulary_capped_at_top_tags() {
        let products: Vec<Product> = (0..60)
            .map(|i| {
                let tag = format!("tag{i}");
                let mut tags = vec![tag.clone()];
                if i >= 55 {
                    tags.push("popular".to_string());
                }
                Product {
                    id: format!("p{i}"),
                    name: format!("Item {i}"),
                    category: "C".to_string(),
                    tags,
                    price: None,
                    rating: None,
                }
            })
            .collect();
        let index = EmbeddingIndex::build(&products).unwrap();
        assert_eq!(index.tag_vocabulary().len(), TOP_TAGS);
        assert_eq!(index.tag_vocabulary()[0], "popular");
        assert_eq!(index.tag_vocabulary()[1], "tag0");
        assert!(!index.tag_vocabulary().contains(&"tag59".to_string()));
        assert_eq!(index.dimension(), TOP_TAGS + 1 + 2);
    }

    #[test]
    fn test_unknown_product_has_no_embedding() {
        let index = EmbeddingIndex::build(&[product("p1", "X", &[], None, None)]).unwrap();
        assert!(index.embedding_of("missing").is_none());
    }

    #[test]
    fn test_missing_numeric_values_everywhere() {
        let products = vec![
            product("p1", "X", &["a"], None, None),
            product("p2", "X", &["a"], None, None),
        ];
        let index = EmbeddingIndex::build(&products).unwrap();
        let e = index.embedding_of("p1").unwrap();
        assert_eq!(&e[e.len() - 2..], &[0.0f32, 0.0]);
    }
}
