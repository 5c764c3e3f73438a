use anyhow::Context;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};

use menu_rs::{
    create_app, init_observability,
    repositories::{
        CategoryRepository, DynamoDbCategoryRepository, DynamoDbItemRepository,
        InMemoryCategoryRepository, InMemoryItemRepository, ItemRepository, TableManager,
    },
    services::S3ImageStore,
    shutdown_observability, AppSettings, AppState, Config, Metrics, StorageBackend, TableNames,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_environment()
        .await
        .context("Failed to load configuration")?;

    init_observability(
        &config.observability.service_name,
        &config.observability.service_version,
        config.observability.otlp_endpoint.as_deref(),
        &config.observability.log_level,
        config.observability.enable_json_logging,
    )?;

    info!(
        "Service: {} v{}",
        config.observability.service_name, config.observability.service_version
    );
    info!("Restaurant: {}", config.database.restaurant_id);

    let metrics = Arc::new(Metrics::new()?);

    let backend = config.database.backend()?;
    let (categories, items, table_manager): (
        Arc<dyn CategoryRepository>,
        Arc<dyn ItemRepository>,
        Option<Arc<TableManager>>,
    ) = match backend {
        StorageBackend::DynamoDb => {
            info!(
                "DynamoDB tables: categories={}, items={}, prices={} in {}",
                config.database.categories_table_name,
                config.database.items_table_name,
                config.database.prices_table_name,
                config.aws.region
            );
            let client = Arc::new(config.aws.dynamodb_client.clone());
            (
                Arc::new(DynamoDbCategoryRepository::new(
                    client.clone(),
                    config.database.categories_table_name.clone(),
                    config.database.restaurant_id.clone(),
                    config.database.region.clone(),
                )),
                Arc::new(DynamoDbItemRepository::new(
                    client.clone(),
                    config.database.items_table_name.clone(),
                    config.database.prices_table_name.clone(),
                    config.database.restaurant_id.clone(),
                    config.database.region.clone(),
                )),
                Some(Arc::new(TableManager::new(client))),
            )
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage, data is lost on restart");
            (
                Arc::new(InMemoryCategoryRepository::new()),
                Arc::new(InMemoryItemRepository::new()),
                None,
            )
        }
    };

    let image_store = Arc::new(S3ImageStore::new(
        config.aws.s3_client.clone(),
        config.storage.images_bucket.clone(),
        config.storage.public_base_url(),
    ));

    let state = AppState::new(
        categories,
        items,
        image_store,
        table_manager,
        metrics,
        AppSettings {
            restaurant_id: config.database.restaurant_id.clone(),
            admin_password: config.auth.admin_password.clone(),
            image_key_prefix: config.storage.images_key_prefix.clone(),
            cookie_secure: config.auth.cookie_secure,
            tables: TableNames {
                categories: config.database.categories_table_name.clone(),
                items: config.database.items_table_name.clone(),
                prices: config.database.prices_table_name.clone(),
            },
        },
    );

    let app = create_app(state)
        .layer(TimeoutLayer::new(config.server.request_timeout()))
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::new(
        config
            .server
            .host
            .parse()
            .with_context(|| format!("Invalid host {}", config.server.host))?,
        config.server.port,
    );
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on {} ({} storage)", addr, backend);

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for shutdown signal: {}", e);
        }
        info!("Shutdown signal received");
        shutdown_observability().await;
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
