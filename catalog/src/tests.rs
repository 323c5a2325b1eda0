#[cfg(test)]
mod tests {
    use crate::{
        feedback_stats, load_catalog, load_feedback, load_interactions, Catalog, InteractionLog,
        ProductQuery, SortField, SortOrder,
    };
    use chrono::{TimeZone, Utc};
    use shoprec_core::{CoreError, EventKind, ExplanationFeedback, Interaction, Product};
    use std::io::Write;

    fn product(id: &str, category: &str, price: Option<f64>) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {id}"),
            category: category.to_string(),
            tags: vec![],
            price,
            rating: None,
        }
    }

    fn interaction(user: &str, product: &str, event: EventKind, minute: u32) -> Interaction {
        Interaction {
            user_id: user.to_string(),
            product_id: product.to_string(),
            event,
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 10, minute, 0).unwrap(),
        }
    }

    fn setup_catalog() -> Catalog {
        Catalog::new(vec![
            product("p1", "Laptops", Some(3000.0)),
            product("p2", "Phones", Some(1500.0)),
            product("p3", "Laptops", None),
            product("p4", "Audio", Some(200.0)),
        ])
        .expect("Failed to build test catalog")
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = Catalog::new(vec![product("p1", "A", None), product("p1", "B", None)]);
        assert!(matches!(result, Err(CoreError::InvalidInput { .. })));
    }

    #[test]
    fn test_lookup_and_positions() {
        let catalog = setup_catalog();
        assert_eq!(catalog.len(), 4);
        assert_eq!(catalog.get("p2").map(|p| p.category.as_str()), Some("Phones"));
        assert_eq!(catalog.position("p3"), Some(2));
        assert!(catalog.get("nope").is_none());
    }

    #[test]
    fn test_resolve_unknown_id() {
        let catalog = setup_catalog();
        assert_eq!(catalog.resolve(&["p1", "p4"]).unwrap().len(), 2);
        let result = catalog.resolve(&["p1", "p9"]);
        assert!(matches!(result, Err(CoreError::NotFound { ref resource }) if resource.contains("p9")));
    }

    #[test]
    fn test_categories_sorted_distinct() {
        let catalog = setup_catalog();
        assert_eq!(catalog.categories(), vec!["Audio", "Laptops", "Phones"]);
    }

    #[test]
    fn test_browse_filter_sort_page() {
        let catalog = setup_catalog();

        let page = catalog.browse(&ProductQuery {
            sort_by: Some(SortField::Price),
            order: SortOrder::Desc,
            page_size: Some(2),
            ..Default::default()
        });
        assert_eq!(page.total, 4);
        let ids: Vec<&str> = page.items.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2"]);

        let second = catalog.browse(&ProductQuery {
            sort_by: Some(SortField::Price),
            order: SortOrder::Desc,
            page: Some(2),
            page_size: Some(2),
            ..Default::default()
        });
        let ids: Vec<&str> = second.items.iter().map(|p| p.id.as_str()).collect();
        // missing price sorts as zero
        assert_eq!(ids, vec!["p4", "p3"]);

        let laptops = catalog.browse(&ProductQuery {
            category: Some("Laptops".to_string()),
            page: Some(0),
            ..Default::default()
        });
        assert_eq!(laptops.page, 1);
        assert_eq!(laptops.page_size, 20);
        assert_eq!(laptops.total, 2);
    }

    #[test]
    fn test_positives_grouping() {
        let catalog = setup_catalog();
        let log = InteractionLog::new(vec![
            interaction("u2", "p3", EventKind::Purchase, 0),
            interaction("u1", "p1", EventKind::View, 1),
            interaction("u1", "p2", EventKind::Wishlist, 2),
            interaction("u1", "p2", EventKind::Purchase, 3),
            interaction("u1", "p9", EventKind::Purchase, 4),
            interaction("u1", "p1", EventKind::AddToCart, 5),
        ]);

        let groups = log.positives_by_user(&catalog);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].user_id, "u2");
        assert_eq!(groups[0].product_ids, vec!["p3"]);
        assert_eq!(groups[1].user_id, "u1");
        assert_eq!(groups[1].product_ids, vec!["p2", "p1"]);
    }

    #[test]
    fn test_liked_products_ignores_views() {
        let catalog = setup_catalog();
        let log = InteractionLog::new(vec![
            interaction("u1", "p4", EventKind::Wishlist, 0),
            interaction("u1", "p3", EventKind::View, 1),
            interaction("u1", "p1", EventKind::Purchase, 2),
        ]);
        let liked: Vec<&str> = log
            .liked_products("u1", &catalog)
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(liked, vec!["p1", "p4"]);
        assert!(log.liked_products("ghost", &catalog).is_empty());
    }

    #[test]
    fn test_cart_wishlist_orders() {
        let catalog = setup_catalog();
        let log = InteractionLog::new(vec![
            interaction("u1", "p1", EventKind::AddToCart, 0),
            interaction("u1", "p2", EventKind::AddToCart, 1),
            interaction("u1", "p1", EventKind::Purchase, 2),
            interaction("u1", "p4", EventKind::Wishlist, 3),
            interaction("u1", "p4", EventKind::Purchase, 4),
            interaction("u1", "p4", EventKind::AddToCart, 5),
        ]);

        let ids = |products: Vec<&Product>| -> Vec<String> {
            products.into_iter().map(|p| p.id.clone()).collect()
        };
        assert_eq!(ids(log.cart("u1", &catalog)), vec!["p2", "p4"]);
        assert_eq!(ids(log.orders("u1", &catalog)), vec!["p1", "p4"]);
        assert_eq!(ids(log.wishlist("u1", &catalog)), vec!["p4"]);
    }

    #[tokio::test]
    async fn test_snapshot_loading() {
        let mut products = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        write!(
            products,
            r#"[{{"id":"p1","name":"Laptop","category":"Laptops","tags":["ssd"],"price":"3.000 Lei","rating":4.7}},
               {{"id":"p2","name":"Phone","category":"Phones","price":1500}}]"#
        )
        .unwrap();
        let mut interactions = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        write!(
            interactions,
            r#"[{{"userId":"u1","productId":"p1","event":"purchase","timestamp":"2024-05-01T10:00:00.000Z"}}]"#
        )
        .unwrap();

        let catalog = load_catalog(products.path()).await.expect("Failed to load catalog");
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("p1").unwrap().price, None);
        assert_eq!(catalog.get("p2").unwrap().price, Some(1500.0));

        let log = load_interactions(interactions.path())
            .await
            .expect("Failed to load interactions");
        assert_eq!(log.len(), 1);
        assert_eq!(log.entries()[0].event, EventKind::Purchase);
    }

    #[tokio::test]
    async fn test_snapshot_errors() {
        let missing = load_catalog(std::path::Path::new("/no/such/products.json")).await;
        assert!(matches!(missing, Err(CoreError::Io(_))));

        let mut broken = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        write!(broken, "{{ not json").unwrap();
        let result = load_interactions(broken.path()).await;
        assert!(matches!(result, Err(CoreError::Serialization(_))));
    }

    fn feedback(model: &str, helpful: bool) -> ExplanationFeedback {
        ExplanationFeedback {
            user_id: "u1".to_string(),
            product_id: "p1".to_string(),
            model: model.to_string(),
            helpful,
            timestamp: None,
        }
    }

    #[test]
    fn test_feedback_stats_per_model() {
        let stats = feedback_stats(&[
            feedback("llm", true),
            feedback("llm", false),
            feedback("llm", true),
            feedback("llm", true),
            feedback("baseline", false),
        ]);
        assert_eq!(stats.llm.total, 4);
        assert_eq!(stats.llm.helpful, 3);
        assert_eq!(stats.llm.helpful_rate, Some(0.75));
        assert_eq!(stats.baseline.total, 1);
        assert_eq!(stats.baseline.helpful_rate, Some(0.0));
    }

    #[test]
    fn test_feedback_rate_is_null_without_entries() {
        let stats = feedback_stats(&[feedback("llm", true)]);
        assert_eq!(stats.baseline.total, 0);
        assert_eq!(stats.baseline.helpful_rate, None);

        let value = serde_json::to_value(stats).unwrap();
        assert!(value["baseline"]["helpfulRate"].is_null());
        assert_eq!(value["llm"]["helpfulRate"], 1.0);
    }

    #[test]
    fn test_feedback_for_unknown_model_is_ignored() {
        let stats = feedback_stats(&[feedback("gpt-4", true), feedback("LLM", true), feedback("baseline", true)]);
        assert_eq!(stats.llm.total, 0);
        assert_eq!(stats.llm.helpful_rate, None);
        assert_eq!(stats.baseline.total, 1);
        assert_eq!(stats.baseline.helpful, 1);
    }

    #[tokio::test]
    async fn test_feedback_loading() {
        let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        write!(
            file,
            r#"[{{"userId":"u1","productId":"p1","model":"llm","helpful":true,"timestamp":"2024-05-01T10:00:00.000Z"}},
               {{"userId":"u2","productId":"p2","model":"baseline","helpful":false}}]"#
        )
        .unwrap();

        let entries = load_feedback(file.path()).await.expect("Failed to load feedback");
        assert_eq!(entries.len(), 2);
        assert!(entries[0].timestamp.is_some());
        assert_eq!(feedback_stats(&entries).llm.helpful, 1);

        let missing = load_feedback(std::path::Path::new("/no/such/feedback.json")).await.unwrap();
        assert!(missing.is_empty());
    }
}
