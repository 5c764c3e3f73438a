// Repositories module - data access layer

pub mod category_repository;
pub mod dynamodb;
pub mod item_repository;
pub mod memory;
pub mod table_manager;

#[cfg(test)]
mod tests;

pub use category_repository::{CategoryRepository, DynamoDbCategoryRepository};
pub use item_repository::{DynamoDbItemRepository, ItemRepository};
pub use memory::{InMemoryCategoryRepository, InMemoryItemRepository};
pub use table_manager::{TableManager, TableSpec};
