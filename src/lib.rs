pub mod config;
pub mod handlers;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod router;
pub mod services;

pub use config::{Config, ConfigError, ParameterStoreConfig, StorageBackend};
pub use handlers::{AppSettings, AppState, TableNames};
pub use observability::{init_observability, shutdown_observability, Metrics};
pub use router::create_app;
