#[cfg(test)]
mod repository_tests {
    use crate::models::{MenuKind, RepositoryError};
    use aws_sdk_dynamodb::types::AttributeValue;
    use std::collections::HashMap;
    use std::sync::Arc;

    use crate::repositories::category_repository::*;
    use crate::repositories::dynamodb::map_dynamodb_error;
    use crate::repositories::item_repository::*;

    fn create_test_client() -> Arc<aws_sdk_dynamodb::Client> {
        let config = aws_sdk_dynamodb::Config::builder()
            .region(aws_sdk_dynamodb::config::Region::new("ap-south-1"))
            .behavior_version(aws_sdk_dynamodb::config::BehaviorVersion::latest())
            .build();
        Arc::new(aws_sdk_dynamodb::Client::from_conf(config))
    }

    fn s(value: &str) -> AttributeValue {
        AttributeValue::S(value.to_string())
    }

    fn minimal_category_item() -> HashMap<String, AttributeValue> {
        HashMap::from([
            ("restaurant_id".to_string(), s("R1")),
            ("id".to_string(), s("C0001")),
            ("kind".to_string(), s("alcohol")),
            ("name_en".to_string(), s("Whisky")),
            ("created_at".to_string(), s("2024-03-01T10:00:00+05:30")),
        ])
    }

    mod category_conversion_tests {
        use super::*;

        #[test]
        fn test_minimal_item_parses() {
            let repo = DynamoDbCategoryRepository::new(
                create_test_client(),
                "cats".to_string(),
                "R1".to_string(),
                "ap-south-1".to_string(),
            );

            let category = repo.item_to_category(minimal_category_item()).unwrap();
            assert_eq!(category.kind, MenuKind::Alcohol);
            assert_eq!(category.name_mr, None);
            assert_eq!(category.display_order, None);
            assert_eq!(category.created_at.to_rfc3339(), "2024-03-01T04:30:00+00:00");
        }

        #[test]
        fn test_missing_required_fields() {
            let repo = DynamoDbCategoryRepository::new(
                create_test_client(),
                "cats".to_string(),
                "R1".to_string(),
                "ap-south-1".to_string(),
            );

            for field in ["id", "name_en", "kind", "created_at"] {
                let mut item = minimal_category_item();
                item.remove(field);
                let result = repo.item_to_category(item);
                assert!(
                    matches!(result, Err(RepositoryError::InvalidQuery { .. })),
                    "expected failure without {}",
                    field
                );
            }
        }

        #[test]
        fn test_non_numeric_display_order_is_ignored() {
            let repo = DynamoDbCategoryRepository::new(
                create_test_client(),
                "cats".to_string(),
                "R1".to_string(),
                "ap-south-1".to_string(),
            );
            let mut item = minimal_category_item();
            item.insert("display_order".to_string(), s("first"));

            let category = repo.item_to_category(item).unwrap();
            assert_eq!(category.display_order, None);
        }
    }

    mod item_conversion_tests {
        use super::*;

        fn repo() -> DynamoDbItemRepository {
            DynamoDbItemRepository::new(
                create_test_client(),
                "items".to_string(),
                "prices".to_string(),
                "R1".to_string(),
                "ap-south-1".to_string(),
            )
        }

        #[test]
        fn test_item_without_tags_defaults_to_false() {
            let mut item = minimal_category_item();
            item.insert("category_id".to_string(), s("C0001"));
            item.insert("id".to_string(), s("I0001"));

            let menu_item = repo().item_to_menu_item(item).unwrap();
            assert_eq!(menu_item.category_id, "C0001");
            assert!(!menu_item.tags.is_veg);
            assert!(!menu_item.tags.is_bestseller);
            assert!(menu_item.is_visible);
        }

        #[test]
        fn test_price_requires_amount() {
            let item = HashMap::from([
                ("item_id".to_string(), s("I0001")),
                ("id".to_string(), s("P0001")),
                ("label_en".to_string(), s("Large")),
            ]);
            assert!(repo().item_to_price(item).is_err());
        }
    }

    mod error_mapping_tests {
        use super::*;
        use aws_sdk_dynamodb::types::error::{
            ConditionalCheckFailedException, ResourceNotFoundException,
        };

        #[test]
        fn test_resource_not_found_maps_to_table_not_found() {
            let error = aws_sdk_dynamodb::Error::ResourceNotFoundException(
                ResourceNotFoundException::builder().build(),
            );
            match map_dynamodb_error("menu-items", error) {
                RepositoryError::TableNotFound { table_name } => {
                    assert_eq!(table_name, "menu-items")
                }
                other => panic!("Expected TableNotFound, got {:?}", other),
            }
        }

        #[test]
        fn test_failed_condition_maps_to_not_found() {
            let error = aws_sdk_dynamodb::Error::ConditionalCheckFailedException(
                ConditionalCheckFailedException::builder().build(),
            );
            assert!(matches!(
                map_dynamodb_error("menu-items", error),
                RepositoryError::NotFound
            ));
        }
    }
}
