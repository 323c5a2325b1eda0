use crate::Catalog;
use shoprec_core::{EventKind, Interaction, Product};
use std::collections::{HashMap, HashSet};

/// Snapshot of the append-only interaction log.
#[derive(Debug, Clone, Default)]
pub struct InteractionLog {
    entries: Vec<Interaction>,
}

/// Distinct positively-interacted product ids of one user, in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPositives {
    pub user_id: String,
    pub product_ids: Vec<String>,
}

impl InteractionLog {
    pub fn new(entries: Vec<Interaction>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[Interaction] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn for_user<'a>(&'a self, user_id: &'a str) -> impl Iterator<Item = &'a Interaction> + 'a {
        self.entries.iter().filter(move |i| i.user_id == user_id)
    }

    /// Groups positive interactions by user. Products missing from the
    /// catalog are dropped; duplicates collapse. Both users and products keep
    /// first-seen order so a seeded split is reproducible.
    pub fn positives_by_user(&self, catalog: &Catalog) -> Vec<UserPositives> {
        let mut groups: Vec<UserPositives> = Vec::new();
        let mut slot_by_user: HashMap<&str, usize> = HashMap::new();
        let mut seen: HashSet<(&str, &str)> = HashSet::new();

        for interaction in &self.entries {
            if !interaction.event.is_positive() || !catalog.contains(&interaction.product_id) {
                continue;
            }
            let slot = *slot_by_user
                .entry(interaction.user_id.as_str())
                .or_insert_with(|| {
                    groups.push(UserPositives {
                        user_id: interaction.user_id.clone(),
                        product_ids: Vec::new(),
                    });
                    groups.len() - 1
                });
            if seen.insert((interaction.user_id.as_str(), interaction.product_id.as_str())) {
                groups[slot].product_ids.push(interaction.product_id.clone());
            }
        }

        groups
    }

    /// Catalog products the user showed positive interest in, in catalog order.
    pub fn liked_products<'c>(&self, user_id: &str, catalog: &'c Catalog) -> Vec<&'c Product> {
        let ids: HashSet<&str> = self
            .for_user(user_id)
            .filter(|i| i.event.is_positive())
            .map(|i| i.product_id.as_str())
            .collect();
        in_catalog_order(catalog, &ids)
    }

    pub fn wishlist<'c>(&self, user_id: &str, catalog: &'c Catalog) -> Vec<&'c Product> {
        self.products_with_event(user_id, EventKind::Wishlist, catalog)
    }

    pub fn orders<'c>(&self, user_id: &str, catalog: &'c Catalog) -> Vec<&'c Product> {
        self.products_with_event(user_id, EventKind::Purchase, catalog)
    }

    /// Products whose latest cart-related event is still `add_to_cart`;
    /// a later purchase takes the product out of the cart.
    pub fn cart<'c>(&self, user_id: &str, catalog: &'c Catalog) -> Vec<&'c Product> {
        let mut last_event: HashMap<&str, EventKind> = HashMap::new();
        for interaction in self.for_user(user_id) {
            if matches!(interaction.event, EventKind::AddToCart | EventKind::Purchase) {
                last_event.insert(interaction.product_id.as_str(), interaction.event);
            }
        }
        let ids: HashSet<&str> = last_event
            .into_iter()
            .filter(|(_, event)| *event == EventKind::AddToCart)
            .map(|(id, _)| id)
            .collect();
        in_catalog_order(catalog, &ids)
    }

    fn products_with_event<'c>(
        &self,
        user_id: &str,
        event: EventKind,
        catalog: &'c Catalog,
    ) -> Vec<&'c Product> {
        let ids: HashSet<&str> = self
            .for_user(user_id)
            .filter(|i| i.event == event)
            .map(|i| i.product_id.as_str())
            .collect();
        in_catalog_order(catalog, &ids)
    }
}

fn in_catalog_order<'c>(catalog: &'c Catalog, ids: &HashSet<&str>) -> Vec<&'c Product> {
    catalog
        .products()
        .iter()
        .filter(|p| ids.contains(p.id.as_str()))
        .collect()
}
