use serde::{Deserialize, Serialize};
use shoprec_core::{CoreError, Product};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

pub mod feedback;
pub mod interactions;
pub mod snapshot;

pub use feedback::feedback_stats;
pub use interactions::{InteractionLog, UserPositives};
pub use snapshot::{load_catalog, load_feedback, load_interactions};

#[cfg(test)]
mod tests;

const DEFAULT_PAGE_SIZE: usize = 20;

/// Read-only product catalog. Storage order is preserved and is meaningful:
/// ranking ties and the no-history fallback both follow it.
#[derive(Debug, Clone)]
pub struct Catalog {
    products: Vec<Product>,
    by_id: HashMap<String, usize>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Result<Self, CoreError> {
        let mut by_id = HashMap::with_capacity(products.len());
        for (position, product) in products.iter().enumerate() {
            if by_id.insert(product.id.clone(), position).is_some() {
                return Err(CoreError::invalid_input(format!(
                    "duplicate product id {}",
                    product.id
                )));
            }
        }
        Ok(Self { products, by_id })
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Product> {
        self.by_id.get(id).map(|&position| &self.products[position])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Storage position of a product, used as the ranking tie-break.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    /// Looks up every id, failing on the first unknown one.
    pub fn resolve<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<&Product>, CoreError> {
        ids.iter()
            .map(|id| {
                let id = id.as_ref();
                self.get(id).ok_or_else(|| CoreError::product_not_found(id))
            })
            .collect()
    }

    /// Distinct non-empty categories, sorted.
    pub fn categories(&self) -> Vec<&str> {
        self.products
            .iter()
            .map(|p| p.category.as_str())
            .filter(|c| !c.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn browse(&self, query: &ProductQuery) -> ProductPage<'_> {
        let mut filtered: Vec<&Product> = self
            .products
            .iter()
            .filter(|p| match &query.category {
                Some(category) => &p.category == category,
                None => true,
            })
            .collect();

        if let Some(field) = query.sort_by {
            filtered.sort_by(|a, b| {
                let ordering = field
                    .value(a)
                    .partial_cmp(&field.value(b))
                    .unwrap_or(Ordering::Equal);
                match query.order {
                    SortOrder::Asc => ordering,
                    SortOrder::Desc => ordering.reverse(),
                }
            });
        }

        let page = query.page.filter(|&p| p > 0).unwrap_or(1);
        let page_size = query
            .page_size
            .filter(|&s| s > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE);
        let total = filtered.len();
        let items = filtered
            .into_iter()
            .skip((page - 1).saturating_mul(page_size))
            .take(page_size)
            .collect();

        ProductPage {
            total,
            page,
            page_size,
            items,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Price,
    Rating,
}

impl SortField {
    /// Absent values sort as zero.
    fn value(self, product: &Product) -> f64 {
        match self {
            SortField::Price => product.price.unwrap_or(0.0),
            SortField::Rating => product.rating.unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    pub category: Option<String>,
    pub sort_by: Option<SortField>,
    #[serde(default)]
    pub order: SortOrder,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage<'a> {
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub items: Vec<&'a Product>,
}
