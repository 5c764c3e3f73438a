pub mod admin;
pub mod auth;
pub mod categories;
pub mod errors;
pub mod health;
pub mod items;
pub mod menu;
pub mod metrics;
pub mod middleware;
pub mod upload;

pub use auth::require_admin;
pub use errors::{service_error_to_response, ApiError};
pub use health::*;
pub use metrics::*;
pub use middleware::*;

use std::sync::Arc;

use crate::observability::{BusinessTracingMiddleware, DatabaseTracingMiddleware, Metrics};
use crate::repositories::{CategoryRepository, ItemRepository, TableManager};
use crate::services::{
    AuthService, CategoryService, ImageStore, ItemService, MenuService, UploadService,
};

/// Names of the three DynamoDB tables
#[derive(Debug, Clone)]
pub struct TableNames {
    pub categories: String,
    pub items: String,
    pub prices: String,
}

/// Shared application state for menu, admin and upload routes
#[derive(Clone)]
pub struct AppState {
    pub category_service: Arc<CategoryService>,
    pub item_service: Arc<ItemService>,
    pub menu_service: Arc<MenuService>,
    pub auth_service: Arc<AuthService>,
    pub upload_service: Arc<UploadService>,
    /// Absent on the in-memory backend
    pub table_manager: Option<Arc<TableManager>>,
    pub tables: TableNames,
    pub metrics: Arc<Metrics>,
    pub business_tracing: Arc<BusinessTracingMiddleware>,
    pub database_tracing: Arc<DatabaseTracingMiddleware>,
    pub cookie_secure: bool,
}

/// Deployment settings the handlers and services need
#[derive(Clone)]
pub struct AppSettings {
    pub restaurant_id: String,
    pub admin_password: String,
    pub image_key_prefix: String,
    pub cookie_secure: bool,
    pub tables: TableNames,
}

impl AppState {
    /// Wire services over the given storage
    pub fn new(
        categories: Arc<dyn CategoryRepository>,
        items: Arc<dyn ItemRepository>,
        image_store: Arc<dyn ImageStore>,
        table_manager: Option<Arc<TableManager>>,
        metrics: Arc<Metrics>,
        settings: AppSettings,
    ) -> Self {
        Self {
            category_service: Arc::new(CategoryService::new(
                categories.clone(),
                items.clone(),
                settings.restaurant_id.clone(),
            )),
            item_service: Arc::new(ItemService::new(
                items.clone(),
                categories.clone(),
                settings.restaurant_id,
            )),
            menu_service: Arc::new(MenuService::new(categories, items)),
            auth_service: Arc::new(AuthService::new(settings.admin_password)),
            upload_service: Arc::new(UploadService::new(image_store, settings.image_key_prefix)),
            table_manager,
            tables: settings.tables,
            business_tracing: Arc::new(BusinessTracingMiddleware::new(metrics.clone())),
            database_tracing: Arc::new(DatabaseTracingMiddleware::new(metrics.clone())),
            metrics,
            cookie_secure: settings.cookie_secure,
        }
    }
}
