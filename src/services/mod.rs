// Services module - business logic layer

pub mod auth_service;
pub mod category_service;
pub mod image_store;
pub mod item_service;
pub mod menu_service;
pub(crate) mod reorder;

#[cfg(test)]
pub(crate) mod mocks;

pub use auth_service::{AuthService, SESSION_COOKIE};
pub use category_service::CategoryService;
pub use image_store::{ImageStore, S3ImageStore, UploadResponse, UploadService};
pub use item_service::ItemService;
pub use menu_service::{assemble_menu, MenuService};
