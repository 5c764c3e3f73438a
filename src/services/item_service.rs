use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;

use crate::models::{
    apply_permutation, next_display_order, renumber, sort_by_display_order, Category,
    CreateItemRequest, MenuItem, MenuKind, ReorderOutcome, ServiceError, ServiceResult,
    UpdateItemRequest, Validate, UNORDERED_POSITION,
};
use crate::repositories::{CategoryRepository, ItemRepository};
use crate::services::reorder::persist_assignments;

/// Service for managing dishes and drinks together with their prices
pub struct ItemService {
    items: Arc<dyn ItemRepository>,
    categories: Arc<dyn CategoryRepository>,
    restaurant_id: String,
}

impl ItemService {
    pub fn new(
        items: Arc<dyn ItemRepository>,
        categories: Arc<dyn CategoryRepository>,
        restaurant_id: String,
    ) -> Self {
        Self {
            items,
            categories,
            restaurant_id,
        }
    }

    /// Every item of a menu, hidden ones included, grouped by category order
    #[instrument(skip(self), fields(kind = %kind))]
    pub async fn list_admin(&self, kind: MenuKind) -> ServiceResult<Vec<MenuItem>> {
        let mut categories = self.categories.find_all(kind).await?;
        sort_by_display_order(&mut categories);
        let category_rank: HashMap<String, usize> = categories
            .into_iter()
            .enumerate()
            .map(|(rank, category)| (category.id, rank))
            .collect();

        let mut items = self.items.find_all(kind).await?;
        items.sort_by_key(|item| {
            (
                category_rank
                    .get(&item.category_id)
                    .copied()
                    .unwrap_or(usize::MAX),
                item.display_order.unwrap_or(UNORDERED_POSITION),
            )
        });

        crate::info_with_trace!("Listed {} items", items.len());
        Ok(items)
    }

    /// Items of one category in display order
    #[instrument(skip(self), fields(kind = %kind, category_id = %category_id))]
    pub async fn list_in_category(
        &self,
        kind: MenuKind,
        category_id: &str,
    ) -> ServiceResult<Vec<MenuItem>> {
        self.category(kind, category_id).await?;
        let mut items = self.items.find_by_category(category_id).await?;
        sort_by_display_order(&mut items);
        Ok(items)
    }

    #[instrument(skip(self), fields(kind = %kind, id = %id))]
    pub async fn get(&self, kind: MenuKind, id: &str) -> ServiceResult<MenuItem> {
        if id.trim().is_empty() {
            return Err(ServiceError::ValidationError {
                message: "Item ID cannot be empty".to_string(),
            });
        }

        match self.items.find_by_id(id).await? {
            Some(item) if item.kind == kind => Ok(item),
            _ => Err(ServiceError::ItemNotFound { id: id.to_string() }),
        }
    }

    /// Create a visible item at the end of its category
    #[instrument(skip(self, request), fields(kind = %kind, name = %request.name_en))]
    pub async fn create(
        &self,
        kind: MenuKind,
        request: CreateItemRequest,
    ) -> ServiceResult<MenuItem> {
        request.validate(kind)?;
        self.category(kind, &request.category_id).await?;

        let existing = self.items.count_in_category(&request.category_id).await?;
        let item = MenuItem::new(
            &self.restaurant_id,
            kind,
            request,
            next_display_order(existing),
        );

        let created = self.items.create(item).await?;
        crate::info_with_trace!(
            item_id = %created.id,
            prices = created.prices.len(),
            "Menu item created"
        );
        Ok(created)
    }

    /// Save the edit form. Prices are deleted and re-inserted.
    #[instrument(skip(self, request), fields(kind = %kind, id = %id))]
    pub async fn update(
        &self,
        kind: MenuKind,
        id: &str,
        request: UpdateItemRequest,
    ) -> ServiceResult<MenuItem> {
        request.validate(kind)?;
        let mut item = self.get(kind, id).await?;

        let moved = item.category_id != request.category_id;
        if moved {
            self.category(kind, &request.category_id).await?;
        }

        let source_category = item.category_id.clone();
        item.apply_update(request);
        if moved {
            // Land at the end of the new category
            let existing = self.items.count_in_category(&item.category_id).await?;
            item.display_order = Some(next_display_order(existing));
        }

        let prices = item.prices.clone();
        let updated = self.items.update(item).await?;
        self.items.replace_prices(&updated.id, prices).await?;
        if moved {
            self.close_gaps(&source_category).await;
        }

        crate::info_with_trace!(
            prices = updated.prices.len(),
            moved_category = moved,
            "Menu item updated"
        );
        Ok(updated)
    }

    /// Flip whether the item appears on the public menu
    #[instrument(skip(self), fields(kind = %kind, id = %id))]
    pub async fn toggle_visibility(&self, kind: MenuKind, id: &str) -> ServiceResult<MenuItem> {
        let mut item = self.get(kind, id).await?;
        item.is_visible = !item.is_visible;
        self.items.set_visibility(id, item.is_visible).await?;
        crate::info_with_trace!(is_visible = item.is_visible, "Item visibility toggled");
        Ok(item)
    }

    /// Flip whether the item's image is shown publicly
    #[instrument(skip(self), fields(kind = %kind, id = %id))]
    pub async fn toggle_image_visibility(
        &self,
        kind: MenuKind,
        id: &str,
    ) -> ServiceResult<MenuItem> {
        let mut item = self.get(kind, id).await?;
        item.is_image_visible = !item.is_image_visible;
        self.items
            .set_image_visibility(id, item.is_image_visible)
            .await?;
        crate::info_with_trace!(
            is_image_visible = item.is_image_visible,
            "Item image visibility toggled"
        );
        Ok(item)
    }

    /// Delete an item and its prices
    #[instrument(skip(self), fields(kind = %kind, id = %id))]
    pub async fn delete(&self, kind: MenuKind, id: &str) -> ServiceResult<()> {
        let item = self.get(kind, id).await?;
        self.items.delete(id).await?;
        crate::info_with_trace!("Menu item deleted");

        self.close_gaps(&item.category_id).await;
        Ok(())
    }

    /// Apply a complete new ordering to the items of one category
    #[instrument(skip(self, ordered_ids), fields(kind = %kind, category_id = %category_id))]
    pub async fn reorder_in_category(
        &self,
        kind: MenuKind,
        category_id: &str,
        ordered_ids: &[String],
    ) -> ServiceResult<ReorderOutcome> {
        let current = self.list_in_category(kind, category_id).await?;
        let reordered = apply_permutation(current, ordered_ids)?;

        Ok(self.persist(&reordered).await)
    }

    /// Renumber what is left in a category after an item leaves it.
    /// The item is already gone, so failures here are only logged.
    async fn close_gaps(&self, category_id: &str) {
        match self.items.find_by_category(category_id).await {
            Ok(mut remaining) => {
                sort_by_display_order(&mut remaining);
                self.persist(&remaining).await;
            }
            Err(e) => {
                crate::warn_with_trace!(
                    category_id = %category_id,
                    error = %e,
                    "Could not renumber items after removal"
                );
            }
        }
    }

    async fn persist(&self, ordered: &[MenuItem]) -> ReorderOutcome {
        let assignments = renumber(ordered);
        let outcome = persist_assignments(ordered.len(), assignments, |id, order| {
            let items = Arc::clone(&self.items);
            async move { items.update_display_order(&id, order).await }
        })
        .await;

        crate::info_with_trace!(
            updated = outcome.updated.len(),
            failed = outcome.failed.len(),
            "Items reordered"
        );
        outcome
    }

    async fn category(&self, kind: MenuKind, id: &str) -> ServiceResult<Category> {
        match self.categories.find_by_id(id).await? {
            Some(category) if category.kind == kind => Ok(category),
            _ => Err(ServiceError::CategoryNotFound { id: id.to_string() }),
        }
    }
}
