use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_ssm::Client as SsmClient;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

pub(crate) const ENV_PREFIX: &str = "MENU";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading error: {message}")]
    LoadError { message: String },

    #[error("Parameter not found: {name}")]
    ParameterNotFound { name: String },

    #[error("AWS SDK error: {source}")]
    AwsSdk {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Environment variable missing: {name}")]
    MissingEnvironmentVariable { name: String },
}

/// Where categories, items and prices are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    DynamoDb,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dynamodb" => Ok(StorageBackend::DynamoDb),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(ConfigError::ValidationError {
                message: format!(
                    "Unknown storage backend '{}', expected 'dynamodb' or 'memory'",
                    other
                ),
            }),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::DynamoDb => write!(f, "dynamodb"),
            StorageBackend::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub aws: AwsConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default = "default_max_request_size")]
    pub max_request_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_storage_backend")]
    pub storage_backend: String,
    #[serde(default = "default_restaurant_id")]
    pub restaurant_id: String,
    #[serde(default = "default_categories_table")]
    pub categories_table_name: String,
    #[serde(default = "default_items_table")]
    pub items_table_name: String,
    #[serde(default = "default_prices_table")]
    pub prices_table_name: String,
    #[serde(default = "default_region")]
    pub region: String,
}

/// Object storage for uploaded menu images
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_images_bucket")]
    pub images_bucket: String,
    /// Custom S3 endpoint, e.g. a Cloudflare R2 account URL
    #[serde(default)]
    pub s3_endpoint: Option<String>,
    #[serde(default)]
    pub images_public_url: String,
    #[serde(default = "default_images_key_prefix")]
    pub images_key_prefix: String,
}

#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub admin_password: String,
    /// SSM parameter holding the admin password; wins over `admin_password`
    #[serde(default)]
    pub admin_password_parameter: Option<String>,
    #[serde(default = "default_cookie_secure")]
    pub cookie_secure: bool,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("admin_password", &"<redacted>")
            .field("admin_password_parameter", &self.admin_password_parameter)
            .field("cookie_secure", &self.cookie_secure)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AwsConfig {
    pub region: String,
    pub dynamodb_client: DynamoDbClient,
    pub s3_client: S3Client,
    pub ssm_client: SsmClient,
    pub parameter_store: Arc<ParameterStoreConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_service_version")]
    pub service_version: String,
    #[serde(default = "default_otlp_endpoint_option")]
    pub otlp_endpoint: Option<String>,
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_enable_json_logging")]
    pub enable_json_logging: bool,
}

pub struct ParameterStoreConfig {
    ssm_client: SsmClient,
    cache: Arc<RwLock<HashMap<String, (String, Instant)>>>,
    cache_ttl: Duration,
}

impl fmt::Debug for ParameterStoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterStoreConfig")
            .field("cache_ttl", &self.cache_ttl)
            .finish()
    }
}

impl Config {
    pub async fn from_environment() -> Result<Self, ConfigError> {
        info!("Loading configuration from environment and AWS Parameter Store");

        let server = ServerConfig::from_env()?;
        let database = DatabaseConfig::from_env()?;
        let storage = StorageConfig::from_env()?;
        let mut auth = AuthConfig::from_env()?;
        let observability = ObservabilityConfig::from_env()?;

        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(database.region.clone()))
            .load()
            .await;

        let dynamodb_client = DynamoDbClient::new(&aws_config);
        let ssm_client = SsmClient::new(&aws_config);

        let mut s3_config = aws_sdk_s3::config::Builder::from(&aws_config);
        if let Some(endpoint) = &storage.s3_endpoint {
            s3_config = s3_config.endpoint_url(endpoint).force_path_style(true);
        }
        let s3_client = S3Client::from_conf(s3_config.build());

        let parameter_store = Arc::new(ParameterStoreConfig::new(
            ssm_client.clone(),
            Duration::from_secs(5 * 60),
        ));

        if let Some(name) = &auth.admin_password_parameter {
            auth.admin_password = parameter_store.get_parameter(name).await?;
            info!(parameter = %name, "Admin password loaded from Parameter Store");
        }

        let aws = AwsConfig {
            region: database.region.clone(),
            dynamodb_client,
            s3_client,
            ssm_client,
            parameter_store,
        };

        let config = Config {
            server,
            database,
            storage,
            auth,
            aws,
            observability,
        };

        config.validate()?;

        info!("Configuration loaded successfully");
        debug!("Configuration: {:?}", config);

        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        info!("Validating configuration");

        self.server.validate()?;
        self.database.validate()?;

        if self.database.backend()? == StorageBackend::DynamoDb {
            self.storage.validate()?;
        }

        if self.auth.admin_password.is_empty() {
            warn!("No admin password configured, admin login is disabled");
        }

        info!("Configuration validation completed");
        Ok(())
    }
}

/// Deserialize one section from `MENU_*` variables
fn load_section<T: DeserializeOwned>(
    source: config::Environment,
    section: &str,
) -> Result<T, ConfigError> {
    let settings = config::Config::builder()
        .add_source(source)
        .build()
        .map_err(|e| ConfigError::LoadError {
            message: format!("Failed to load {} config: {}", section, e),
        })?;

    settings
        .try_deserialize()
        .map_err(|e| ConfigError::LoadError {
            message: format!("Failed to deserialize {} config: {}", section, e),
        })
}

pub(crate) fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
}

impl ServerConfig {
    pub(crate) fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(environment())
    }

    pub(crate) fn from_source(source: config::Environment) -> Result<Self, ConfigError> {
        load_section(source, "server")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::ValidationError {
                message: "Server port cannot be 0".to_string(),
            });
        }

        if self.request_timeout_seconds == 0 {
            return Err(ConfigError::ValidationError {
                message: "Request timeout cannot be 0".to_string(),
            });
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub(crate) fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(environment())
    }

    pub(crate) fn from_source(source: config::Environment) -> Result<Self, ConfigError> {
        load_section(source, "database")
    }

    pub fn backend(&self) -> Result<StorageBackend, ConfigError> {
        self.storage_backend.parse()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.backend()?;

        if self.restaurant_id.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "Restaurant id cannot be empty".to_string(),
            });
        }

        for (label, name) in [
            ("Categories", &self.categories_table_name),
            ("Items", &self.items_table_name),
            ("Prices", &self.prices_table_name),
        ] {
            if name.is_empty() {
                return Err(ConfigError::ValidationError {
                    message: format!("{} table name cannot be empty", label),
                });
            }
        }
        Ok(())
    }
}

impl StorageConfig {
    pub(crate) fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(environment())
    }

    pub(crate) fn from_source(source: config::Environment) -> Result<Self, ConfigError> {
        load_section(source, "storage")
    }

    /// Base URL images are served from; falls back to the bucket path on the endpoint
    pub fn public_base_url(&self) -> String {
        if !self.images_public_url.trim().is_empty() {
            return self.images_public_url.trim_end_matches('/').to_string();
        }
        match &self.s3_endpoint {
            Some(endpoint) => format!(
                "{}/{}",
                endpoint.trim_end_matches('/'),
                self.images_bucket
            ),
            None => format!("https://{}.s3.amazonaws.com", self.images_bucket),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.images_bucket.is_empty() {
            return Err(ConfigError::ValidationError {
                message: "Images bucket cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}

impl AuthConfig {
    pub(crate) fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(environment())
    }

    pub(crate) fn from_source(source: config::Environment) -> Result<Self, ConfigError> {
        load_section(source, "auth")
    }
}

impl ObservabilityConfig {
    pub(crate) fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(environment())
    }

    pub(crate) fn from_source(source: config::Environment) -> Result<Self, ConfigError> {
        load_section(source, "observability")
    }
}

impl ParameterStoreConfig {
    pub fn new(ssm_client: SsmClient, cache_ttl: Duration) -> Self {
        Self {
            ssm_client,
            cache: Arc::new(RwLock::new(HashMap::new())),
            cache_ttl,
        }
    }

    pub async fn get_parameter(&self, name: &str) -> Result<String, ConfigError> {
        debug!("Getting parameter: {}", name);

        {
            let cache = self.cache.read().await;
            if let Some((value, timestamp)) = cache.get(name) {
                if timestamp.elapsed() < self.cache_ttl {
                    debug!("Parameter found in cache: {}", name);
                    return Ok(value.clone());
                }
                debug!("Parameter cache expired: {}", name);
            }
        }

        debug!("Fetching parameter from AWS SSM: {}", name);
        let result = self
            .ssm_client
            .get_parameter()
            .name(name)
            .with_decryption(true)
            .send()
            .await
            .map_err(|e| ConfigError::AwsSdk {
                source: Box::new(e),
            })?;

        let value = result
            .parameter()
            .and_then(|p| p.value())
            .ok_or_else(|| ConfigError::ParameterNotFound {
                name: name.to_string(),
            })?
            .to_string();

        {
            let mut cache = self.cache.write().await;
            cache.insert(name.to_string(), (value.clone(), Instant::now()));
        }

        debug!("Parameter retrieved and cached: {}", name);
        Ok(value)
    }
}

// Default value functions
pub(crate) fn default_host() -> String {
    "0.0.0.0".to_string()
}

pub(crate) fn default_port() -> u16 {
    8080
}

pub(crate) fn default_timeout() -> u64 {
    30
}

pub(crate) fn default_max_request_size() -> usize {
    1024 * 1024 // 1MB
}

pub(crate) fn default_storage_backend() -> String {
    "dynamodb".to_string()
}

pub(crate) fn default_restaurant_id() -> String {
    "pathare".to_string()
}

pub(crate) fn default_categories_table() -> String {
    "MenuCategories".to_string()
}

pub(crate) fn default_items_table() -> String {
    "MenuItems".to_string()
}

pub(crate) fn default_prices_table() -> String {
    "MenuItemPrices".to_string()
}

pub(crate) fn default_region() -> String {
    "us-west-2".to_string()
}

pub(crate) fn default_images_bucket() -> String {
    "menu-images".to_string()
}

pub(crate) fn default_images_key_prefix() -> String {
    "pathare-new".to_string()
}

pub(crate) fn default_cookie_secure() -> bool {
    true
}

pub(crate) fn default_service_name() -> String {
    "menu-rs".to_string()
}

pub(crate) fn default_service_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

pub(crate) fn default_otlp_endpoint_option() -> Option<String> {
    std::env::var("MENU_OTLP_ENDPOINT").ok()
}

pub(crate) fn default_enable_json_logging() -> bool {
    std::env::var("MENU_ENABLE_JSON_LOGGING")
        .map(|v| v.to_lowercase() == "true")
        .unwrap_or(false)
}

pub(crate) fn default_metrics_port() -> u16 {
    9090
}

pub(crate) fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests;
