//! In-memory repository implementations.
//!
//! Used for local development without DynamoDB and by the integration tests.
//! Data is lost when the process exits.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{CategoryRepository, ItemRepository};
use crate::models::{
    Category, MenuItem, MenuKind, Price, RepositoryError, RepositoryResult,
};

#[derive(Debug, Clone, Default)]
pub struct InMemoryCategoryRepository {
    categories: Arc<RwLock<HashMap<String, Category>>>,
}

impl InMemoryCategoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn find_all(&self, kind: MenuKind) -> RepositoryResult<Vec<Category>> {
        let categories = self.categories.read().await;
        let mut found: Vec<Category> = categories
            .values()
            .filter(|c| c.kind == kind)
            .cloned()
            .collect();
        // HashMap order is arbitrary; creation order stands in for store order
        found.sort_by_key(|c| c.created_at);
        Ok(found)
    }

    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Category>> {
        Ok(self.categories.read().await.get(id).cloned())
    }

    async fn create(&self, category: Category) -> RepositoryResult<Category> {
        let mut categories = self.categories.write().await;
        if categories.contains_key(&category.id) {
            return Err(RepositoryError::ConstraintViolation {
                message: format!("Category {} already exists", category.id),
            });
        }
        categories.insert(category.id.clone(), category.clone());
        Ok(category)
    }

    async fn update(&self, category: Category) -> RepositoryResult<Category> {
        let mut categories = self.categories.write().await;
        match categories.get_mut(&category.id) {
            Some(existing) => {
                *existing = category.clone();
                Ok(category)
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn update_display_order(&self, id: &str, display_order: i32) -> RepositoryResult<()> {
        let mut categories = self.categories.write().await;
        let category = categories.get_mut(id).ok_or(RepositoryError::NotFound)?;
        category.display_order = Some(display_order);
        category.updated_at = chrono::Utc::now();
        Ok(())
    }

    async fn delete(&self, id: &str) -> RepositoryResult<()> {
        self.categories.write().await.remove(id);
        Ok(())
    }

    async fn count(&self, kind: MenuKind) -> RepositoryResult<usize> {
        let categories = self.categories.read().await;
        Ok(categories.values().filter(|c| c.kind == kind).count())
    }
}

/// Items and prices live in separate maps, mirroring the two DynamoDB tables
#[derive(Debug, Clone, Default)]
pub struct InMemoryItemRepository {
    items: Arc<RwLock<HashMap<String, MenuItem>>>,
    prices: Arc<RwLock<HashMap<String, Vec<Price>>>>,
}

impl InMemoryItemRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored price rows across all items
    pub async fn price_row_count(&self) -> usize {
        self.prices.read().await.values().map(Vec::len).sum()
    }

    async fn with_prices(&self, mut items: Vec<MenuItem>) -> Vec<MenuItem> {
        let prices = self.prices.read().await;
        for item in &mut items {
            item.prices = prices.get(&item.id).cloned().unwrap_or_default();
        }
        items.sort_by_key(|item| item.created_at);
        items
    }

    async fn modify<F>(&self, id: &str, change: F) -> RepositoryResult<()>
    where
        F: FnOnce(&mut MenuItem) + Send,
    {
        let mut items = self.items.write().await;
        let item = items.get_mut(id).ok_or(RepositoryError::NotFound)?;
        change(item);
        item.updated_at = chrono::Utc::now();
        Ok(())
    }
}

#[async_trait]
impl ItemRepository for InMemoryItemRepository {
    async fn find_all(&self, kind: MenuKind) -> RepositoryResult<Vec<MenuItem>> {
        let found: Vec<MenuItem> = {
            let items = self.items.read().await;
            items.values().filter(|i| i.kind == kind).cloned().collect()
        };
        Ok(self.with_prices(found).await)
    }

    async fn find_by_category(&self, category_id: &str) -> RepositoryResult<Vec<MenuItem>> {
        let found: Vec<MenuItem> = {
            let items = self.items.read().await;
            items
                .values()
                .filter(|i| i.category_id == category_id)
                .cloned()
                .collect()
        };
        Ok(self.with_prices(found).await)
    }

    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<MenuItem>> {
        let found = self.items.read().await.get(id).cloned();
        match found {
            Some(item) => Ok(self.with_prices(vec![item]).await.pop()),
            None => Ok(None),
        }
    }

    async fn create(&self, item: MenuItem) -> RepositoryResult<MenuItem> {
        let mut items = self.items.write().await;
        if items.contains_key(&item.id) {
            return Err(RepositoryError::ConstraintViolation {
                message: format!("Item {} already exists", item.id),
            });
        }
        let mut record = item.clone();
        let prices = std::mem::take(&mut record.prices);
        items.insert(record.id.clone(), record);
        self.prices.write().await.insert(item.id.clone(), prices);
        Ok(item)
    }

    async fn update(&self, item: MenuItem) -> RepositoryResult<MenuItem> {
        let mut items = self.items.write().await;
        match items.get_mut(&item.id) {
            Some(existing) => {
                *existing = MenuItem {
                    prices: Vec::new(),
                    ..item.clone()
                };
                Ok(item)
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn set_visibility(&self, id: &str, is_visible: bool) -> RepositoryResult<()> {
        self.modify(id, |item| item.is_visible = is_visible).await
    }

    async fn set_image_visibility(
        &self,
        id: &str,
        is_image_visible: bool,
    ) -> RepositoryResult<()> {
        self.modify(id, |item| item.is_image_visible = is_image_visible)
            .await
    }

    async fn update_display_order(&self, id: &str, display_order: i32) -> RepositoryResult<()> {
        self.modify(id, |item| item.display_order = Some(display_order))
            .await
    }

    async fn replace_prices(&self, item_id: &str, prices: Vec<Price>) -> RepositoryResult<()> {
        let mut stored = self.prices.write().await;
        stored.remove(item_id);
        if !prices.is_empty() {
            stored.insert(item_id.to_string(), prices);
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> RepositoryResult<()> {
        self.prices.write().await.remove(id);
        self.items.write().await.remove(id);
        Ok(())
    }

    async fn count_in_category(&self, category_id: &str) -> RepositoryResult<usize> {
        let items = self.items.read().await;
        Ok(items
            .values()
            .filter(|i| i.category_id == category_id)
            .count())
    }
}
