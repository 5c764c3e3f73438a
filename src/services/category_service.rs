use std::sync::Arc;
use tracing::instrument;

use crate::models::{
    apply_permutation, move_item, next_display_order, renumber, sort_by_display_order, Category,
    CreateCategoryRequest, MenuKind, ReorderOutcome, ServiceError, ServiceResult,
    UpdateCategoryRequest, Validate,
};
use crate::repositories::{CategoryRepository, ItemRepository};
use crate::services::reorder::persist_assignments;

/// Service for managing menu categories
pub struct CategoryService {
    categories: Arc<dyn CategoryRepository>,
    items: Arc<dyn ItemRepository>,
    restaurant_id: String,
}

impl CategoryService {
    pub fn new(
        categories: Arc<dyn CategoryRepository>,
        items: Arc<dyn ItemRepository>,
        restaurant_id: String,
    ) -> Self {
        Self {
            categories,
            items,
            restaurant_id,
        }
    }

    /// Categories of a menu in display order
    #[instrument(skip(self), fields(kind = %kind))]
    pub async fn list(&self, kind: MenuKind) -> ServiceResult<Vec<Category>> {
        let mut categories = self.categories.find_all(kind).await?;
        sort_by_display_order(&mut categories);
        crate::info_with_trace!("Listed {} categories", categories.len());
        Ok(categories)
    }

    /// A category that belongs to `kind`
    #[instrument(skip(self), fields(kind = %kind, id = %id))]
    pub async fn get(&self, kind: MenuKind, id: &str) -> ServiceResult<Category> {
        match self.categories.find_by_id(id).await? {
            Some(category) if category.kind == kind => Ok(category),
            _ => Err(ServiceError::CategoryNotFound { id: id.to_string() }),
        }
    }

    /// Create a category at the end of the list
    #[instrument(skip(self, request), fields(kind = %kind, name = %request.name_en))]
    pub async fn create(
        &self,
        kind: MenuKind,
        request: CreateCategoryRequest,
    ) -> ServiceResult<Category> {
        request.validate(kind)?;

        let existing = self.categories.count(kind).await?;
        let category = Category::new(
            &self.restaurant_id,
            kind,
            request,
            next_display_order(existing),
        );

        let created = self.categories.create(category).await?;
        crate::info_with_trace!(
            category_id = %created.id,
            display_order = ?created.display_order,
            "Category created"
        );
        Ok(created)
    }

    #[instrument(skip(self, request), fields(kind = %kind, id = %id))]
    pub async fn rename(
        &self,
        kind: MenuKind,
        id: &str,
        request: UpdateCategoryRequest,
    ) -> ServiceResult<Category> {
        request.validate(kind)?;

        let mut category = self.get(kind, id).await?;
        category.rename(request);

        let updated = self.categories.update(category).await?;
        crate::info_with_trace!("Category renamed");
        Ok(updated)
    }

    /// Delete an empty category. Categories that still hold items are refused.
    #[instrument(skip(self), fields(kind = %kind, id = %id))]
    pub async fn delete(&self, kind: MenuKind, id: &str) -> ServiceResult<()> {
        self.get(kind, id).await?;

        let item_count = self.items.count_in_category(id).await?;
        if item_count > 0 {
            crate::warn_with_trace!(item_count, "Refusing to delete non-empty category");
            return Err(ServiceError::CategoryNotEmpty {
                id: id.to_string(),
                item_count,
            });
        }

        self.categories.delete(id).await?;
        crate::info_with_trace!("Category deleted");

        // Close the gap so the next create lands after the last survivor
        match self.list(kind).await {
            Ok(remaining) => {
                self.persist(remaining).await;
            }
            Err(e) => {
                crate::warn_with_trace!(error = %e, "Could not renumber categories after delete");
            }
        }
        Ok(())
    }

    /// Apply a complete new ordering, e.g. after a drag-and-drop
    #[instrument(skip(self, ordered_ids), fields(kind = %kind, count = ordered_ids.len()))]
    pub async fn reorder(
        &self,
        kind: MenuKind,
        ordered_ids: &[String],
    ) -> ServiceResult<ReorderOutcome> {
        let current = self.list(kind).await?;
        let reordered = apply_permutation(current, ordered_ids)?;
        Ok(self.persist(reordered).await)
    }

    /// Move one category from position `from` to position `to` (0-based)
    #[instrument(skip(self), fields(kind = %kind))]
    pub async fn move_category(
        &self,
        kind: MenuKind,
        from: usize,
        to: usize,
    ) -> ServiceResult<ReorderOutcome> {
        let mut current = self.list(kind).await?;
        move_item(&mut current, from, to)?;
        Ok(self.persist(current).await)
    }

    async fn persist(&self, ordered: Vec<Category>) -> ReorderOutcome {
        let assignments = renumber(&ordered);
        let outcome = persist_assignments(ordered.len(), assignments, |id, order| {
            let categories = Arc::clone(&self.categories);
            async move { categories.update_display_order(&id, order).await }
        })
        .await;

        crate::info_with_trace!(
            updated = outcome.updated.len(),
            unchanged = outcome.unchanged,
            failed = outcome.failed.len(),
            "Categories reordered"
        );
        outcome
    }
}
