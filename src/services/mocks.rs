//! Repository mocks shared by the service tests

use async_trait::async_trait;
use mockall::mock;

use crate::models::{Category, MenuItem, MenuKind, Price, RepositoryResult};
use crate::repositories::{CategoryRepository, ItemRepository};

mock! {
    pub TestCategoryRepository {}

    #[async_trait]
    impl CategoryRepository for TestCategoryRepository {
        async fn find_all(&self, kind: MenuKind) -> RepositoryResult<Vec<Category>>;
        async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Category>>;
        async fn create(&self, category: Category) -> RepositoryResult<Category>;
        async fn update(&self, category: Category) -> RepositoryResult<Category>;
        async fn update_display_order(&self, id: &str, display_order: i32) -> RepositoryResult<()>;
        async fn delete(&self, id: &str) -> RepositoryResult<()>;
        async fn count(&self, kind: MenuKind) -> RepositoryResult<usize>;
    }
}

mock! {
    pub TestItemRepository {}

    #[async_trait]
    impl ItemRepository for TestItemRepository {
        async fn find_all(&self, kind: MenuKind) -> RepositoryResult<Vec<MenuItem>>;
        async fn find_by_category(&self, category_id: &str) -> RepositoryResult<Vec<MenuItem>>;
        async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<MenuItem>>;
        async fn create(&self, item: MenuItem) -> RepositoryResult<MenuItem>;
        async fn update(&self, item: MenuItem) -> RepositoryResult<MenuItem>;
        async fn set_visibility(&self, id: &str, is_visible: bool) -> RepositoryResult<()>;
        async fn set_image_visibility(&self, id: &str, is_image_visible: bool) -> RepositoryResult<()>;
        async fn update_display_order(&self, id: &str, display_order: i32) -> RepositoryResult<()>;
        async fn replace_prices(&self, item_id: &str, prices: Vec<Price>) -> RepositoryResult<()>;
        async fn delete(&self, id: &str) -> RepositoryResult<()>;
        async fn count_in_category(&self, category_id: &str) -> RepositoryResult<usize>;
    }
}
