#[cfg(test)]
mod config_tests {
    use crate::config::{
        default_categories_table, default_host, default_images_key_prefix, default_items_table,
        default_log_level, default_max_request_size, default_metrics_port, default_port,
        default_prices_table, default_region, default_restaurant_id, default_service_name,
        default_timeout, AuthConfig, ConfigError, DatabaseConfig, ObservabilityConfig,
        ParameterStoreConfig, ServerConfig, StorageBackend, StorageConfig, ENV_PREFIX,
    };
    use aws_sdk_ssm::Client as SsmClient;
    use std::collections::HashMap;
    use std::time::Duration;

    fn source(vars: &[(&str, &str)]) -> config::Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (format!("{}_{}", ENV_PREFIX, k), v.to_string()))
            .collect();
        config::Environment::with_prefix(ENV_PREFIX).source(Some(map))
    }

    #[test]
    fn test_server_config_defaults() {
        let config = ServerConfig::from_source(source(&[])).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.request_timeout_seconds, 30);
        assert_eq!(config.max_request_size, 1024 * 1024);
    }

    #[test]
    fn test_database_config_from_env() {
        let config = DatabaseConfig::from_source(source(&[
            ("STORAGE_BACKEND", "memory"),
            ("RESTAURANT_ID", "pathare-dadar"),
            ("CATEGORIES_TABLE_NAME", "TestCategories"),
            ("ITEMS_TABLE_NAME", "TestItems"),
            ("PRICES_TABLE_NAME", "TestPrices"),
            ("REGION", "ap-south-1"),
        ]))
        .unwrap();

        assert_eq!(config.backend().unwrap(), StorageBackend::Memory);
        assert_eq!(config.restaurant_id, "pathare-dadar");
        assert_eq!(config.categories_table_name, "TestCategories");
        assert_eq!(config.items_table_name, "TestItems");
        assert_eq!(config.prices_table_name, "TestPrices");
        assert_eq!(config.region, "ap-south-1");
    }

    #[test]
    fn test_database_config_validation() {
        let mut config = DatabaseConfig::from_source(source(&[])).unwrap();
        assert!(config.validate().is_ok());

        config.storage_backend = "postgres".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError { .. })
        ));

        config.storage_backend = "memory".to_string();
        config.restaurant_id = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_storage_backend_parsing() {
        assert_eq!(
            "DynamoDB".parse::<StorageBackend>().unwrap(),
            StorageBackend::DynamoDb
        );
        assert_eq!(
            " memory ".parse::<StorageBackend>().unwrap(),
            StorageBackend::Memory
        );
        assert!("sqlite".parse::<StorageBackend>().is_err());
        assert_eq!(StorageBackend::Memory.to_string(), "memory");
    }

    #[test]
    fn test_storage_public_url() {
        let config = StorageConfig::from_source(source(&[
            ("IMAGES_BUCKET", "menu"),
            ("S3_ENDPOINT", "https://account.r2.cloudflarestorage.com/"),
        ]))
        .unwrap();
        assert_eq!(
            config.public_base_url(),
            "https://account.r2.cloudflarestorage.com/menu"
        );
        assert_eq!(config.images_key_prefix, "pathare-new");

        let config = StorageConfig::from_source(source(&[
            ("IMAGES_BUCKET", "menu"),
            ("IMAGES_PUBLIC_URL", "https://images.example.com/"),
        ]))
        .unwrap();
        assert_eq!(config.public_base_url(), "https://images.example.com");

        let config = StorageConfig::from_source(source(&[("IMAGES_BUCKET", "menu")])).unwrap();
        assert_eq!(config.public_base_url(), "https://menu.s3.amazonaws.com");
    }

    #[test]
    fn test_auth_config_redacts_password() {
        let config = AuthConfig::from_source(source(&[
            ("ADMIN_PASSWORD", "hunter2"),
            ("COOKIE_SECURE", "false"),
        ]))
        .unwrap();

        assert_eq!(config.admin_password, "hunter2");
        assert!(!config.cookie_secure);
        assert!(config.admin_password_parameter.is_none());
        assert!(!format!("{:?}", config).contains("hunter2"));
    }

    #[test]
    fn test_observability_config_from_env() {
        let config = ObservabilityConfig::from_source(source(&[
            ("SERVICE_NAME", "test-service"),
            ("SERVICE_VERSION", "1.0.0"),
            ("METRICS_PORT", "9091"),
            ("LOG_LEVEL", "debug"),
        ]))
        .unwrap();

        assert_eq!(config.service_name, "test-service");
        assert_eq!(config.service_version, "1.0.0");
        assert_eq!(config.metrics_port, 9091);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_server_config_validation() {
        let mut config = ServerConfig {
            host: "localhost".to_string(),
            port: 8080,
            request_timeout_seconds: 45,
            max_request_size: 1024,
        };

        assert_eq!(config.request_timeout(), Duration::from_secs(45));
        assert!(config.validate().is_ok());

        config.port = 0;
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn test_parameter_store_caches_lookups() {
        use wiremock::matchers::{body_string_contains, header, method};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-amz-target", "AmazonSSM.GetParameter"))
            .and(body_string_contains("/menu/admin-password"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"Parameter":{"Name":"/menu/admin-password","Type":"SecureString","Value":"pathare@123"}}"#,
                "application/x-amz-json-1.1",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let ssm_config = aws_sdk_ssm::Config::builder()
            .behavior_version(aws_sdk_ssm::config::BehaviorVersion::latest())
            .region(aws_sdk_ssm::config::Region::new("ap-south-1"))
            .credentials_provider(aws_sdk_ssm::config::Credentials::new(
                "test", "test", None, None, "test",
            ))
            .retry_config(aws_sdk_ssm::config::retry::RetryConfig::disabled())
            .endpoint_url(server.uri())
            .build();
        let parameter_store = ParameterStoreConfig::new(
            SsmClient::from_conf(ssm_config),
            Duration::from_secs(60),
        );

        for _ in 0..2 {
            let value = parameter_store
                .get_parameter("/menu/admin-password")
                .await
                .unwrap();
            assert_eq!(value, "pathare@123");
        }
    }

    #[test]
    fn test_config_error_display() {
        let error = ConfigError::ParameterNotFound {
            name: "test_param".to_string(),
        };
        assert_eq!(error.to_string(), "Parameter not found: test_param");

        let error = ConfigError::ValidationError {
            message: "Invalid configuration".to_string(),
        };
        assert_eq!(error.to_string(), "Validation error: Invalid configuration");
    }

    #[test]
    fn test_default_values() {
        assert_eq!(default_host(), "0.0.0.0");
        assert_eq!(default_port(), 8080);
        assert_eq!(default_timeout(), 30);
        assert_eq!(default_max_request_size(), 1024 * 1024);
        assert_eq!(default_restaurant_id(), "pathare");
        assert_eq!(default_categories_table(), "MenuCategories");
        assert_eq!(default_items_table(), "MenuItems");
        assert_eq!(default_prices_table(), "MenuItemPrices");
        assert_eq!(default_region(), "us-west-2");
        assert_eq!(default_images_key_prefix(), "pathare-new");
        assert_eq!(default_service_name(), "menu-rs");
        assert_eq!(default_metrics_port(), 9090);
        assert_eq!(default_log_level(), "info");
    }
}
