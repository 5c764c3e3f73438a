use async_trait::async_trait;
use aws_sdk_dynamodb::operation::RequestId;
use aws_sdk_dynamodb::types::{AttributeValue, Select};
use aws_sdk_dynamodb::Client as DynamoDbClient;
use std::sync::Arc;
use tracing::{error, info, instrument, warn, Instrument};

use super::dynamodb::{
    dynamodb_span, get_datetime, get_opt_i32, get_opt_s, get_parsed, get_s, map_dynamodb_error,
    put_opt_s, Item,
};
use crate::models::{Category, MenuKind, RepositoryError, RepositoryResult};

/// Trait defining the interface for category data access operations
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// All categories of a menu, in store order
    async fn find_all(&self, kind: MenuKind) -> RepositoryResult<Vec<Category>>;

    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Category>>;

    async fn create(&self, category: Category) -> RepositoryResult<Category>;

    async fn update(&self, category: Category) -> RepositoryResult<Category>;

    /// Write a single display order; used once per element when reordering
    async fn update_display_order(&self, id: &str, display_order: i32) -> RepositoryResult<()>;

    async fn delete(&self, id: &str) -> RepositoryResult<()>;

    async fn count(&self, kind: MenuKind) -> RepositoryResult<usize>;
}

/// DynamoDB implementation of the CategoryRepository trait.
///
/// Table layout: hash key `restaurant_id`, range key `id`.
pub struct DynamoDbCategoryRepository {
    client: Arc<DynamoDbClient>,
    table_name: String,
    restaurant_id: String,
    region: String,
}

impl DynamoDbCategoryRepository {
    pub fn new(
        client: Arc<DynamoDbClient>,
        table_name: String,
        restaurant_id: String,
        region: String,
    ) -> Self {
        Self {
            client,
            table_name,
            restaurant_id,
            region,
        }
    }

    /// Get the table name (for testing)
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    fn span(&self, operation: &str) -> tracing::Span {
        dynamodb_span(operation, &self.table_name, &self.region)
    }

    fn key(&self, id: &str) -> [(String, AttributeValue); 2] {
        [
            (
                "restaurant_id".to_string(),
                AttributeValue::S(self.restaurant_id.clone()),
            ),
            ("id".to_string(), AttributeValue::S(id.to_string())),
        ]
    }

    /// Convert a Category to DynamoDB attribute values
    pub fn category_to_item(&self, category: &Category) -> Item {
        let mut item = Item::new();

        item.insert(
            "restaurant_id".to_string(),
            AttributeValue::S(category.restaurant_id.clone()),
        );
        item.insert("id".to_string(), AttributeValue::S(category.id.clone()));
        item.insert(
            "kind".to_string(),
            AttributeValue::S(category.kind.to_string()),
        );
        item.insert(
            "name_en".to_string(),
            AttributeValue::S(category.name_en.clone()),
        );
        put_opt_s(&mut item, "name_mr", &category.name_mr);
        if let Some(order) = category.display_order {
            item.insert(
                "display_order".to_string(),
                AttributeValue::N(order.to_string()),
            );
        }
        item.insert(
            "created_at".to_string(),
            AttributeValue::S(category.created_at.to_rfc3339()),
        );
        item.insert(
            "updated_at".to_string(),
            AttributeValue::S(category.updated_at.to_rfc3339()),
        );

        item
    }

    /// Convert a DynamoDB item to a Category
    pub fn item_to_category(&self, item: Item) -> RepositoryResult<Category> {
        let created_at =
            get_datetime(&item, "created_at").ok_or_else(|| RepositoryError::InvalidQuery {
                message: "Invalid created_at".to_string(),
            })?;

        Ok(Category {
            id: get_s(&item, "id")?,
            restaurant_id: get_s(&item, "restaurant_id")?,
            kind: get_parsed(&item, "kind")?,
            name_en: get_s(&item, "name_en")?,
            name_mr: get_opt_s(&item, "name_mr"),
            display_order: get_opt_i32(&item, "display_order"),
            created_at,
            // Older rows may lack updated_at
            updated_at: get_datetime(&item, "updated_at").unwrap_or(created_at),
        })
    }

    fn parse_all(&self, items: Vec<Item>) -> Vec<Category> {
        items
            .into_iter()
            .filter_map(|item| match self.item_to_category(item) {
                Ok(category) => Some(category),
                Err(e) => {
                    warn!("Failed to parse category item: {}", e);
                    None
                }
            })
            .collect()
    }
}

#[async_trait]
impl CategoryRepository for DynamoDbCategoryRepository {
    #[instrument(skip(self), fields(table = %self.table_name, kind = %kind))]
    async fn find_all(&self, kind: MenuKind) -> RepositoryResult<Vec<Category>> {
        info!("Finding all categories");

        let mut items = Vec::new();
        let mut start_key = None;
        loop {
            let response = async {
                self.client
                    .query()
                    .table_name(&self.table_name)
                    .key_condition_expression("restaurant_id = :restaurant_id")
                    .filter_expression("#kind = :kind")
                    .expression_attribute_names("#kind", "kind")
                    .expression_attribute_values(
                        ":restaurant_id",
                        AttributeValue::S(self.restaurant_id.clone()),
                    )
                    .expression_attribute_values(":kind", AttributeValue::S(kind.to_string()))
                    .set_exclusive_start_key(start_key.take())
                    .send()
                    .await
                    .map_err(|e| map_dynamodb_error(&self.table_name, e.into()))
            }
            .instrument(self.span("Query"))
            .await?;

            items.extend(response.items.unwrap_or_default());
            match response.last_evaluated_key {
                Some(key) => start_key = Some(key),
                None => break,
            }
        }

        let categories = self.parse_all(items);
        info!("Found {} categories", categories.len());
        Ok(categories)
    }

    #[instrument(skip(self), fields(table = %self.table_name, id = %id))]
    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Category>> {
        let [hash, range] = self.key(id);

        let response = async {
            let result = self
                .client
                .get_item()
                .table_name(&self.table_name)
                .key(hash.0, hash.1)
                .key(range.0, range.1)
                .send()
                .await;

            match &result {
                Ok(output) => {
                    tracing::Span::current().record("http.status_code", 200);
                    if let Some(request_id) = output.request_id() {
                        tracing::Span::current().record("aws.request_id", request_id);
                    }
                }
                Err(e) => {
                    tracing::Span::current().record("http.status_code", 400);
                    error!("DynamoDB GetItem failed: {}", e);
                }
            }

            result.map_err(|e| map_dynamodb_error(&self.table_name, e.into()))
        }
        .instrument(self.span("GetItem"))
        .await?;

        response
            .item
            .map(|item| self.item_to_category(item))
            .transpose()
    }

    #[instrument(skip(self, category), fields(table = %self.table_name, id = %category.id))]
    async fn create(&self, category: Category) -> RepositoryResult<Category> {
        info!("Creating category");

        let item = self.category_to_item(&category);
        async {
            self.client
                .put_item()
                .table_name(&self.table_name)
                .set_item(Some(item))
                .condition_expression("attribute_not_exists(id)")
                .send()
                .await
                .map_err(|e| map_dynamodb_error(&self.table_name, e.into()))
        }
        .instrument(self.span("PutItem"))
        .await?;

        Ok(category)
    }

    #[instrument(skip(self, category), fields(table = %self.table_name, id = %category.id))]
    async fn update(&self, category: Category) -> RepositoryResult<Category> {
        info!("Updating category");

        let item = self.category_to_item(&category);
        async {
            self.client
                .put_item()
                .table_name(&self.table_name)
                .set_item(Some(item))
                .condition_expression("attribute_exists(id)")
                .send()
                .await
                .map_err(|e| map_dynamodb_error(&self.table_name, e.into()))
        }
        .instrument(self.span("PutItem"))
        .await?;

        Ok(category)
    }

    #[instrument(skip(self), fields(table = %self.table_name, id = %id))]
    async fn update_display_order(&self, id: &str, display_order: i32) -> RepositoryResult<()> {
        let [hash, range] = self.key(id);

        async {
            self.client
                .update_item()
                .table_name(&self.table_name)
                .key(hash.0, hash.1)
                .key(range.0, range.1)
                .update_expression("SET display_order = :order, updated_at = :now")
                .expression_attribute_values(":order", AttributeValue::N(display_order.to_string()))
                .expression_attribute_values(
                    ":now",
                    AttributeValue::S(chrono::Utc::now().to_rfc3339()),
                )
                .condition_expression("attribute_exists(id)")
                .send()
                .await
                .map_err(|e| map_dynamodb_error(&self.table_name, e.into()))
        }
        .instrument(self.span("UpdateItem"))
        .await?;

        Ok(())
    }

    #[instrument(skip(self), fields(table = %self.table_name, id = %id))]
    async fn delete(&self, id: &str) -> RepositoryResult<()> {
        info!("Deleting category");
        let [hash, range] = self.key(id);

        async {
            self.client
                .delete_item()
                .table_name(&self.table_name)
                .key(hash.0, hash.1)
                .key(range.0, range.1)
                .send()
                .await
                .map_err(|e| map_dynamodb_error(&self.table_name, e.into()))
        }
        .instrument(self.span("DeleteItem"))
        .await?;

        Ok(())
    }

    #[instrument(skip(self), fields(table = %self.table_name, kind = %kind))]
    async fn count(&self, kind: MenuKind) -> RepositoryResult<usize> {
        let response = async {
            self.client
                .query()
                .table_name(&self.table_name)
                .select(Select::Count)
                .key_condition_expression("restaurant_id = :restaurant_id")
                .filter_expression("#kind = :kind")
                .expression_attribute_names("#kind", "kind")
                .expression_attribute_values(
                    ":restaurant_id",
                    AttributeValue::S(self.restaurant_id.clone()),
                )
                .expression_attribute_values(":kind", AttributeValue::S(kind.to_string()))
                .send()
                .await
                .map_err(|e| map_dynamodb_error(&self.table_name, e.into()))
        }
        .instrument(self.span("Query"))
        .await?;

        Ok(response.count() as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateCategoryRequest;

    fn create_test_repo() -> DynamoDbCategoryRepository {
        let config = aws_sdk_dynamodb::Config::builder()
            .region(aws_sdk_dynamodb::config::Region::new("ap-south-1"))
            .behavior_version(aws_sdk_dynamodb::config::BehaviorVersion::latest())
            .build();
        let client = Arc::new(aws_sdk_dynamodb::Client::from_conf(config));
        DynamoDbCategoryRepository::new(
            client,
            "menu-categories".to_string(),
            "R1".to_string(),
            "ap-south-1".to_string(),
        )
    }

    fn create_test_category() -> Category {
        Category::new(
            "R1",
            MenuKind::Food,
            CreateCategoryRequest {
                name_en: "Main Course".to_string(),
                name_mr: Some("मुख्य जेवण".to_string()),
            },
            2,
        )
    }

    #[test]
    fn test_category_to_item_conversion() {
        let repo = create_test_repo();
        let item = repo.category_to_item(&create_test_category());

        assert_eq!(item.get("kind"), Some(&AttributeValue::S("food".to_string())));
        assert_eq!(
            item.get("display_order"),
            Some(&AttributeValue::N("2".to_string()))
        );
        assert!(item.contains_key("restaurant_id"));
        assert!(item.contains_key("name_mr"));
    }

    #[test]
    fn test_item_to_category_conversion() {
        let repo = create_test_repo();
        let category = create_test_category();

        let converted = repo
            .item_to_category(repo.category_to_item(&category))
            .unwrap();

        assert_eq!(converted.id, category.id);
        assert_eq!(converted.kind, MenuKind::Food);
        assert_eq!(converted.name_mr, category.name_mr);
        assert_eq!(converted.display_order, Some(2));
    }

    #[test]
    fn test_missing_display_order_and_updated_at() {
        let repo = create_test_repo();
        let mut item = repo.category_to_item(&create_test_category());
        item.remove("display_order");
        item.remove("updated_at");

        let converted = repo.item_to_category(item).unwrap();
        assert_eq!(converted.display_order, None);
        assert_eq!(converted.updated_at, converted.created_at);
    }

    #[test]
    fn test_invalid_kind_is_rejected() {
        let repo = create_test_repo();
        let mut item = repo.category_to_item(&create_test_category());
        item.insert("kind".to_string(), AttributeValue::S("desserts".to_string()));

        assert!(repo.item_to_category(item).is_err());
        assert_eq!(repo.table_name(), "menu-categories");
    }
}
