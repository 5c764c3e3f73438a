use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, Select};
use aws_sdk_dynamodb::Client as DynamoDbClient;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn, Instrument};

use super::dynamodb::{
    dynamodb_span, get_bool, get_datetime, get_decimal, get_opt_i32, get_opt_s, get_parsed,
    get_s, map_dynamodb_error, put_opt_s, Item,
};
use crate::models::{ItemTags, MenuItem, MenuKind, Price, RepositoryError, RepositoryResult};

/// Trait defining the interface for menu item data access operations.
/// Items are returned with their prices attached.
#[async_trait]
pub trait ItemRepository: Send + Sync {
    async fn find_all(&self, kind: MenuKind) -> RepositoryResult<Vec<MenuItem>>;

    async fn find_by_category(&self, category_id: &str) -> RepositoryResult<Vec<MenuItem>>;

    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<MenuItem>>;

    /// Store a new item and its prices
    async fn create(&self, item: MenuItem) -> RepositoryResult<MenuItem>;

    /// Store the item record only; prices go through `replace_prices`
    async fn update(&self, item: MenuItem) -> RepositoryResult<MenuItem>;

    async fn set_visibility(&self, id: &str, is_visible: bool) -> RepositoryResult<()>;

    async fn set_image_visibility(&self, id: &str, is_image_visible: bool)
        -> RepositoryResult<()>;

    async fn update_display_order(&self, id: &str, display_order: i32) -> RepositoryResult<()>;

    /// Drop every price of the item, then store `prices`
    async fn replace_prices(&self, item_id: &str, prices: Vec<Price>) -> RepositoryResult<()>;

    /// Delete the item's prices, then the item
    async fn delete(&self, id: &str) -> RepositoryResult<()>;

    async fn count_in_category(&self, category_id: &str) -> RepositoryResult<usize>;
}

/// DynamoDB implementation of the ItemRepository trait.
///
/// Items: hash `restaurant_id`, range `id`, GSI `CategoryIndex` on `category_id`.
/// Prices: hash `item_id`, range `id`.
pub struct DynamoDbItemRepository {
    client: Arc<DynamoDbClient>,
    table_name: String,
    prices_table_name: String,
    category_index: String,
    restaurant_id: String,
    region: String,
}

impl DynamoDbItemRepository {
    pub fn new(
        client: Arc<DynamoDbClient>,
        table_name: String,
        prices_table_name: String,
        restaurant_id: String,
        region: String,
    ) -> Self {
        Self {
            client,
            table_name,
            prices_table_name,
            category_index: "CategoryIndex".to_string(),
            restaurant_id,
            region,
        }
    }

    /// Get the table name (for testing)
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Get the category index name (for testing)
    pub fn category_index(&self) -> &str {
        &self.category_index
    }

    fn span(&self, operation: &str) -> tracing::Span {
        dynamodb_span(operation, &self.table_name, &self.region)
    }

    fn prices_span(&self, operation: &str) -> tracing::Span {
        dynamodb_span(operation, &self.prices_table_name, &self.region)
    }

    fn item_error(&self, error: aws_sdk_dynamodb::Error) -> RepositoryError {
        map_dynamodb_error(&self.table_name, error)
    }

    fn price_error(&self, error: aws_sdk_dynamodb::Error) -> RepositoryError {
        map_dynamodb_error(&self.prices_table_name, error)
    }

    /// Convert a MenuItem (without its prices) to DynamoDB attribute values
    pub fn menu_item_to_item(&self, menu_item: &MenuItem) -> Item {
        let mut item = Item::new();

        item.insert(
            "restaurant_id".to_string(),
            AttributeValue::S(menu_item.restaurant_id.clone()),
        );
        item.insert("id".to_string(), AttributeValue::S(menu_item.id.clone()));
        item.insert(
            "kind".to_string(),
            AttributeValue::S(menu_item.kind.to_string()),
        );
        item.insert(
            "category_id".to_string(),
            AttributeValue::S(menu_item.category_id.clone()),
        );
        item.insert(
            "name_en".to_string(),
            AttributeValue::S(menu_item.name_en.clone()),
        );
        put_opt_s(&mut item, "name_mr", &menu_item.name_mr);
        put_opt_s(&mut item, "description_en", &menu_item.description_en);
        put_opt_s(&mut item, "description_mr", &menu_item.description_mr);
        put_opt_s(&mut item, "image_url", &menu_item.image_url);
        item.insert(
            "is_visible".to_string(),
            AttributeValue::Bool(menu_item.is_visible),
        );
        item.insert(
            "is_image_visible".to_string(),
            AttributeValue::Bool(menu_item.is_image_visible),
        );

        let tags = &menu_item.tags;
        for (field, value) in [
            ("is_veg", tags.is_veg),
            ("is_chef_special", tags.is_chef_special),
            ("is_house_special", tags.is_house_special),
            ("is_bestseller", tags.is_bestseller),
        ] {
            item.insert(field.to_string(), AttributeValue::Bool(value));
        }

        if let Some(order) = menu_item.display_order {
            item.insert(
                "display_order".to_string(),
                AttributeValue::N(order.to_string()),
            );
        }
        item.insert(
            "created_at".to_string(),
            AttributeValue::S(menu_item.created_at.to_rfc3339()),
        );
        item.insert(
            "updated_at".to_string(),
            AttributeValue::S(menu_item.updated_at.to_rfc3339()),
        );

        item
    }

    /// Convert a DynamoDB item to a MenuItem with no prices
    pub fn item_to_menu_item(&self, item: Item) -> RepositoryResult<MenuItem> {
        let created_at =
            get_datetime(&item, "created_at").ok_or_else(|| RepositoryError::InvalidQuery {
                message: "Invalid created_at".to_string(),
            })?;

        Ok(MenuItem {
            id: get_s(&item, "id")?,
            restaurant_id: get_s(&item, "restaurant_id")?,
            kind: get_parsed(&item, "kind")?,
            category_id: get_s(&item, "category_id")?,
            name_en: get_s(&item, "name_en")?,
            name_mr: get_opt_s(&item, "name_mr"),
            description_en: get_opt_s(&item, "description_en"),
            description_mr: get_opt_s(&item, "description_mr"),
            image_url: get_opt_s(&item, "image_url"),
            is_visible: get_bool(&item, "is_visible", true),
            is_image_visible: get_bool(&item, "is_image_visible", true),
            tags: ItemTags {
                is_veg: get_bool(&item, "is_veg", false),
                is_chef_special: get_bool(&item, "is_chef_special", false),
                is_house_special: get_bool(&item, "is_house_special", false),
                is_bestseller: get_bool(&item, "is_bestseller", false),
            },
            display_order: get_opt_i32(&item, "display_order"),
            prices: Vec::new(),
            created_at,
            updated_at: get_datetime(&item, "updated_at").unwrap_or(created_at),
        })
    }

    pub fn price_to_item(&self, price: &Price) -> Item {
        let mut item = Item::new();
        item.insert(
            "item_id".to_string(),
            AttributeValue::S(price.item_id.clone()),
        );
        item.insert("id".to_string(), AttributeValue::S(price.id.clone()));
        item.insert(
            "restaurant_id".to_string(),
            AttributeValue::S(self.restaurant_id.clone()),
        );
        put_opt_s(&mut item, "label_en", &price.label_en);
        put_opt_s(&mut item, "label_mr", &price.label_mr);
        item.insert(
            "amount".to_string(),
            AttributeValue::N(price.amount.to_string()),
        );
        item
    }

    pub fn item_to_price(&self, item: Item) -> RepositoryResult<Price> {
        Ok(Price {
            id: get_s(&item, "id")?,
            item_id: get_s(&item, "item_id")?,
            label_en: get_opt_s(&item, "label_en"),
            label_mr: get_opt_s(&item, "label_mr"),
            amount: get_decimal(&item, "amount")?,
        })
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

    /// Every page of a `CategoryIndex` query for this restaurant.
    /// Returns the raw rows and the summed `Count`.
    async fn query_category_index(
        &self,
        category_id: &str,
        select: Option<Select>,
    ) -> RepositoryResult<(Vec<Item>, usize)> {
        let mut raw = Vec::new();
        let mut count = 0;
        let mut start_key = None;
        loop {
            let response = async {
                self.client
                    .query()
                    .table_name(&self.table_name)
                    .index_name(&self.category_index)
                    .set_select(select.clone())
                    .key_condition_expression("category_id = :category_id")
                    .filter_expression("restaurant_id = :restaurant_id")
                    .expression_attribute_values(
                        ":category_id",
                        AttributeValue::S(category_id.to_string()),
                    )
                    .expression_attribute_values(
                        ":restaurant_id",
                        AttributeValue::S(self.restaurant_id.clone()),
                    )
                    .set_exclusive_start_key(start_key.take())
                    .send()
                    .await
                    .map_err(|e| self.item_error(e.into()))
            }
            .instrument(self.span("Query"))
            .await?;

            count += response.count().max(0) as usize;
            raw.extend(response.items.unwrap_or_default());
            match response.last_evaluated_key {
                Some(key) => start_key = Some(key),
                None => break,
            }
        }
        Ok((raw, count))
    }

    fn parse_items(&self, items: Vec<Item>) -> Vec<MenuItem> {
        items
            .into_iter()
            .filter_map(|item| match self.item_to_menu_item(item) {
                Ok(menu_item) => Some(menu_item),
                Err(e) => {
                    warn!("Failed to parse menu item: {}", e);
                    None
                }
            })
            .collect()
    }

    /// Prices of a single item, in store order
    async fn prices_for(&self, item_id: &str) -> RepositoryResult<Vec<Price>> {
        let response = async {
            self.client
                .query()
                .table_name(&self.prices_table_name)
                .key_condition_expression("item_id = :item_id")
                .expression_attribute_values(":item_id", AttributeValue::S(item_id.to_string()))
                .send()
                .await
                .map_err(|e| self.price_error(e.into()))
        }
        .instrument(self.prices_span("Query"))
        .await?;

        Ok(response
            .items
            .unwrap_or_default()
            .into_iter()
            .filter_map(|item| self.item_to_price(item).ok())
            .collect())
    }

    /// Every price row of the restaurant, grouped by item
    async fn all_prices(&self) -> RepositoryResult<HashMap<String, Vec<Price>>> {
        let mut grouped: HashMap<String, Vec<Price>> = HashMap::new();
        let mut start_key = None;

        loop {
            let response = async {
                self.client
                    .scan()
                    .table_name(&self.prices_table_name)
                    .filter_expression("restaurant_id = :restaurant_id")
                    .expression_attribute_values(
                        ":restaurant_id",
                        AttributeValue::S(self.restaurant_id.clone()),
                    )
                    .set_exclusive_start_key(start_key.take())
                    .send()
                    .await
                    .map_err(|e| self.price_error(e.into()))
            }
            .instrument(self.prices_span("Scan"))
            .await?;

            for item in response.items.unwrap_or_default() {
                match self.item_to_price(item) {
                    Ok(price) => grouped.entry(price.item_id.clone()).or_default().push(price),
                    Err(e) => warn!("Failed to parse price item: {}", e),
                }
            }

            match response.last_evaluated_key {
                Some(key) => start_key = Some(key),
                None => break,
            }
        }

        Ok(grouped)
    }

    async fn put_prices(&self, prices: &[Price]) -> RepositoryResult<()> {
        for price in prices {
            let item = self.price_to_item(price);
            async {
                self.client
                    .put_item()
                    .table_name(&self.prices_table_name)
                    .set_item(Some(item))
                    .send()
                    .await
                    .map_err(|e| self.price_error(e.into()))
            }
            .instrument(self.prices_span("PutItem"))
            .await?;
        }
        Ok(())
    }

    async fn delete_prices(&self, item_id: &str) -> RepositoryResult<usize> {
        let existing = self.prices_for(item_id).await?;
        for price in &existing {
            async {
                self.client
                    .delete_item()
                    .table_name(&self.prices_table_name)
                    .key("item_id", AttributeValue::S(item_id.to_string()))
                    .key("id", AttributeValue::S(price.id.clone()))
                    .send()
                    .await
                    .map_err(|e| self.price_error(e.into()))
            }
            .instrument(self.prices_span("DeleteItem"))
            .await?;
        }
        Ok(existing.len())
    }

    async fn set_flag(&self, id: &str, field: &str, value: bool) -> RepositoryResult<()> {
        let [hash, range] = self.key(id);
        async {
            self.client
                .update_item()
                .table_name(&self.table_name)
                .key(hash.0, hash.1)
                .key(range.0, range.1)
                .update_expression("SET #flag = :value, updated_at = :now")
                .expression_attribute_names("#flag", field)
                .expression_attribute_values(":value", AttributeValue::Bool(value))
                .expression_attribute_values(
                    ":now",
                    AttributeValue::S(chrono::Utc::now().to_rfc3339()),
                )
                .condition_expression("attribute_exists(id)")
                .send()
                .await
                .map_err(|e| self.item_error(e.into()))
        }
        .instrument(self.span("UpdateItem"))
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ItemRepository for DynamoDbItemRepository {
    #[instrument(skip(self), fields(table = %self.table_name, kind = %kind))]
    async fn find_all(&self, kind: MenuKind) -> RepositoryResult<Vec<MenuItem>> {
        info!("Finding all menu items");

        let mut raw = Vec::new();
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
                    .map_err(|e| self.item_error(e.into()))
            }
            .instrument(self.span("Query"))
            .await?;

            raw.extend(response.items.unwrap_or_default());
            match response.last_evaluated_key {
                Some(key) => start_key = Some(key),
                None => break,
            }
        }

        let mut items = self.parse_items(raw);
        let mut prices = self.all_prices().await?;
        for item in &mut items {
            item.prices = prices.remove(&item.id).unwrap_or_default();
        }

        info!("Found {} menu items", items.len());
        Ok(items)
    }

    #[instrument(skip(self), fields(table = %self.table_name, category_id = %category_id))]
    async fn find_by_category(&self, category_id: &str) -> RepositoryResult<Vec<MenuItem>> {
        let (raw, _) = self.query_category_index(category_id, None).await?;

        let mut items = self.parse_items(raw);
        for item in &mut items {
            item.prices = self.prices_for(&item.id).await?;
        }

        info!("Found {} items in category", items.len());
        Ok(items)
    }

    #[instrument(skip(self), fields(table = %self.table_name, id = %id))]
    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<MenuItem>> {
        let [hash, range] = self.key(id);

        let response = async {
            self.client
                .get_item()
                .table_name(&self.table_name)
                .key(hash.0, hash.1)
                .key(range.0, range.1)
                .send()
                .await
                .map_err(|e| self.item_error(e.into()))
        }
        .instrument(self.span("GetItem"))
        .await?;

        match response.item {
            Some(item) => {
                let mut menu_item = self.item_to_menu_item(item)?;
                menu_item.prices = self.prices_for(id).await?;
                Ok(Some(menu_item))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self, item), fields(table = %self.table_name, id = %item.id))]
    async fn create(&self, item: MenuItem) -> RepositoryResult<MenuItem> {
        info!("Creating menu item with {} price(s)", item.prices.len());

        let record = self.menu_item_to_item(&item);
        async {
            self.client
                .put_item()
                .table_name(&self.table_name)
                .set_item(Some(record))
                .condition_expression("attribute_not_exists(id)")
                .send()
                .await
                .map_err(|e| self.item_error(e.into()))
        }
        .instrument(self.span("PutItem"))
        .await?;

        self.put_prices(&item.prices).await?;
        Ok(item)
    }

    #[instrument(skip(self, item), fields(table = %self.table_name, id = %item.id))]
    async fn update(&self, item: MenuItem) -> RepositoryResult<MenuItem> {
        info!("Updating menu item");

        let record = self.menu_item_to_item(&item);
        async {
            self.client
                .put_item()
                .table_name(&self.table_name)
                .set_item(Some(record))
                .condition_expression("attribute_exists(id)")
                .send()
                .await
                .map_err(|e| self.item_error(e.into()))
        }
        .instrument(self.span("PutItem"))
        .await?;

        Ok(item)
    }

    #[instrument(skip(self), fields(table = %self.table_name, id = %id))]
    async fn set_visibility(&self, id: &str, is_visible: bool) -> RepositoryResult<()> {
        self.set_flag(id, "is_visible", is_visible).await
    }

    #[instrument(skip(self), fields(table = %self.table_name, id = %id))]
    async fn set_image_visibility(
        &self,
        id: &str,
        is_image_visible: bool,
    ) -> RepositoryResult<()> {
        self.set_flag(id, "is_image_visible", is_image_visible).await
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
                .map_err(|e| self.item_error(e.into()))
        }
        .instrument(self.span("UpdateItem"))
        .await?;
        Ok(())
    }

    #[instrument(skip(self, prices), fields(table = %self.prices_table_name, item_id = %item_id))]
    async fn replace_prices(&self, item_id: &str, prices: Vec<Price>) -> RepositoryResult<()> {
        let removed = self.delete_prices(item_id).await?;
        self.put_prices(&prices).await?;
        info!("Replaced {} price(s) with {}", removed, prices.len());
        Ok(())
    }

    #[instrument(skip(self), fields(table = %self.table_name, id = %id))]
    async fn delete(&self, id: &str) -> RepositoryResult<()> {
        info!("Deleting menu item");

        self.delete_prices(id).await?;

        let [hash, range] = self.key(id);
        async {
            self.client
                .delete_item()
                .table_name(&self.table_name)
                .key(hash.0, hash.1)
                .key(range.0, range.1)
                .send()
                .await
                .map_err(|e| self.item_error(e.into()))
        }
        .instrument(self.span("DeleteItem"))
        .await?;

        Ok(())
    }

    #[instrument(skip(self), fields(table = %self.table_name, category_id = %category_id))]
    async fn count_in_category(&self, category_id: &str) -> RepositoryResult<usize> {
        let (_, count) = self
            .query_category_index(category_id, Some(Select::Count))
            .await?;
        Ok(count)
    }
}
