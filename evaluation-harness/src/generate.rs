use catalog::Catalog;
use chrono::Utc;
use fastrand::Rng;
use shoprec_core::{EventKind, Interaction, Product, UserPreference};
use std::collections::HashMap;
use tracing::{info, warn};

/// Most products one synthetic user touches in a single category.
pub const PICKS_PER_CATEGORY: usize = 8;

/// Category under which products without one are grouped.
const UNCATEGORIZED: &str = "other";

/// Builds a synthetic interaction log for the evaluation protocol.
///
/// For every preferred category up to [`PICKS_PER_CATEGORY`] distinct products
/// are drawn at random. The first draw is a purchase, the next two go to the
/// cart and the rest are wishlisted. Categories without products are skipped.
/// All events share one timestamp.
pub fn generate_interactions(
    catalog: &Catalog,
    users: &[UserPreference],
    rng: &mut Rng,
) -> Vec<Interaction> {
    let by_category = group_by_category(catalog.products());
    let timestamp = Utc::now();
    let mut interactions = Vec::new();

    for user in users {
        for category in &user.preferred_categories {
            let Some(products) = by_category.get(category.as_str()) else {
                warn!(
                    "No products for category {:?}, skipping it for user {}",
                    category, user.user_id
                );
                continue;
            };

            let picked = sample(products, PICKS_PER_CATEGORY, rng);
            interactions.extend(picked.into_iter().enumerate().map(|(position, product)| {
                Interaction {
                    user_id: user.user_id.clone(),
                    product_id: product.id.clone(),
                    event: event_for_pick(position),
                    timestamp,
                }
            }));
        }
    }

    info!(
        "Generated {} interactions for {} users",
        interactions.len(),
        users.len()
    );
    interactions
}

fn event_for_pick(position: usize) -> EventKind {
    match position {
        0 => EventKind::Purchase,
        1 | 2 => EventKind::AddToCart,
        _ => EventKind::Wishlist,
    }
}

fn group_by_category(products: &[Product]) -> HashMap<&str, Vec<&Product>> {
    let mut groups: HashMap<&str, Vec<&Product>> = HashMap::new();
    for product in products {
        let category = match product.category.as_str() {
            "" => UNCATEGORIZED,
            category => category,
        };
        groups.entry(category).or_default().push(product);
    }
    groups
}

/// Up to `n` distinct items in draw order.
fn sample<'p>(items: &[&'p Product], n: usize, rng: &mut Rng) -> Vec<&'p Product> {
    let mut pool = items.to_vec();
    let mut picked = Vec::with_capacity(n.min(pool.len()));
    while picked.len() < n && !pool.is_empty() {
        picked.push(pool.swap_remove(rng.usize(..pool.len())));
    }
    picked
}
