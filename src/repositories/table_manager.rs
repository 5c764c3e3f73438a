use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, GlobalSecondaryIndex, KeySchemaElement, KeyType,
    Projection, ProjectionType, ScalarAttributeType, TableStatus,
};
use aws_sdk_dynamodb::Client as DynamoDbClient;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

use super::dynamodb::map_dynamodb_error;
use crate::models::{RepositoryError, RepositoryResult};

/// Key layout of one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    pub name: String,
    pub hash_key: &'static str,
    pub range_key: &'static str,
    /// `(index name, hash key)` of an optional global secondary index
    pub index: Option<(&'static str, &'static str)>,
}

impl TableSpec {
    pub fn categories(name: &str) -> Self {
        Self {
            name: name.to_string(),
            hash_key: "restaurant_id",
            range_key: "id",
            index: None,
        }
    }

    pub fn items(name: &str) -> Self {
        Self {
            name: name.to_string(),
            hash_key: "restaurant_id",
            range_key: "id",
            index: Some(("CategoryIndex", "category_id")),
        }
    }

    pub fn prices(name: &str) -> Self {
        Self {
            name: name.to_string(),
            hash_key: "item_id",
            range_key: "id",
            index: None,
        }
    }

    /// Every string attribute that takes part in a key
    pub fn key_attributes(&self) -> Vec<&'static str> {
        let mut attributes = vec![self.hash_key, self.range_key];
        if let Some((_, index_key)) = self.index {
            if !attributes.contains(&index_key) {
                attributes.push(index_key);
            }
        }
        attributes
    }
}

fn sdk_error(what: &str, e: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::AwsSdk {
        message: format!("Failed to build {}: {}", what, e),
    }
}

fn key_element(name: &str, key_type: KeyType) -> RepositoryResult<KeySchemaElement> {
    KeySchemaElement::builder()
        .attribute_name(name)
        .key_type(key_type)
        .build()
        .map_err(|e| sdk_error("key schema", e))
}

/// Manages DynamoDB table creation and configuration
pub struct TableManager {
    client: Arc<DynamoDbClient>,
}

impl TableManager {
    pub fn new(client: Arc<DynamoDbClient>) -> Self {
        Self { client }
    }

    /// Create a table from its spec unless it already exists
    #[instrument(skip(self, spec), fields(table_name = %spec.name))]
    pub async fn create_table(&self, spec: &TableSpec) -> RepositoryResult<()> {
        if self.table_exists(&spec.name).await? {
            info!("Table {} already exists", spec.name);
            return Ok(());
        }

        info!("Creating table");

        let attribute_definitions = spec
            .key_attributes()
            .into_iter()
            .map(|name| {
                AttributeDefinition::builder()
                    .attribute_name(name)
                    .attribute_type(ScalarAttributeType::S)
                    .build()
                    .map_err(|e| sdk_error("attribute definition", e))
            })
            .collect::<RepositoryResult<Vec<_>>>()?;

        let key_schema = vec![
            key_element(spec.hash_key, KeyType::Hash)?,
            key_element(spec.range_key, KeyType::Range)?,
        ];

        let mut request = self
            .client
            .create_table()
            .table_name(&spec.name)
            .set_attribute_definitions(Some(attribute_definitions))
            .set_key_schema(Some(key_schema))
            .billing_mode(BillingMode::PayPerRequest);

        if let Some((index_name, index_key)) = spec.index {
            let gsi = GlobalSecondaryIndex::builder()
                .index_name(index_name)
                .key_schema(key_element(index_key, KeyType::Hash)?)
                .projection(
                    Projection::builder()
                        .projection_type(ProjectionType::All)
                        .build(),
                )
                .build()
                .map_err(|e| sdk_error("GSI", e))?;
            request = request.global_secondary_indexes(gsi);
        }

        request
            .send()
            .await
            .map_err(|e| map_dynamodb_error(&spec.name, e.into()))?;

        info!("Table creation initiated, waiting for table to become active");
        self.wait_for_table_active(&spec.name).await?;
        info!("Table {} created successfully", spec.name);

        Ok(())
    }

    #[instrument(skip(self), fields(table_name = %table_name))]
    pub async fn table_exists(&self, table_name: &str) -> RepositoryResult<bool> {
        match self.client.describe_table().table_name(table_name).send().await {
            Ok(_) => Ok(true),
            Err(e) => {
                let is_not_found = e
                    .as_service_error()
                    .is_some_and(|service_error| service_error.is_resource_not_found_exception());
                if is_not_found {
                    info!("Table {} does not exist", table_name);
                    Ok(false)
                } else {
                    error!("Error checking table existence: {}", e);
                    Err(RepositoryError::ConnectionFailed)
                }
            }
        }
    }

    #[instrument(skip(self), fields(table_name = %table_name))]
    async fn wait_for_table_active(&self, table_name: &str) -> RepositoryResult<()> {
        let max_attempts = 30;
        let wait_duration = Duration::from_secs(2);

        for _ in 0..max_attempts {
            let response = self
                .client
                .describe_table()
                .table_name(table_name)
                .send()
                .await
                .map_err(|e| map_dynamodb_error(table_name, e.into()))?;

            match response.table.and_then(|table| table.table_status) {
                Some(TableStatus::Active) => {
                    info!("Table {} is now active", table_name);
                    return Ok(());
                }
                Some(status) => info!("Table {} status: {:?}, waiting...", table_name, status),
                None => warn!("Table {} status unknown, waiting...", table_name),
            }

            tokio::time::sleep(wait_duration).await;
        }

        error!("Timeout waiting for table {} to become active", table_name);
        Err(RepositoryError::Timeout)
    }

    /// Create the categories, items and prices tables
    #[instrument(skip(self))]
    pub async fn create_all_tables(
        &self,
        categories_table: &str,
        items_table: &str,
        prices_table: &str,
    ) -> RepositoryResult<()> {
        info!("Creating all tables");

        let categories = TableSpec::categories(categories_table);
        let items = TableSpec::items(items_table);
        let prices = TableSpec::prices(prices_table);

        let (categories_result, items_result, prices_result) = tokio::join!(
            self.create_table(&categories),
            self.create_table(&items),
            self.create_table(&prices)
        );

        categories_result?;
        items_result?;
        prices_result?;

        info!("All tables created successfully");
        Ok(())
    }
}
