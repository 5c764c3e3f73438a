use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use menu_rs::{
    create_app,
    models::ServiceResult,
    repositories::{InMemoryCategoryRepository, InMemoryItemRepository},
    services::ImageStore,
    AppSettings, AppState, Metrics, TableNames,
};

pub const ADMIN_PASSWORD: &str = "test-password";

/// Image store that keeps uploaded keys in memory
#[derive(Default)]
pub struct StubImageStore {
    pub keys: Mutex<Vec<String>>,
}

#[async_trait]
impl ImageStore for StubImageStore {
    async fn put(&self, key: &str, _content_type: &str, _bytes: Vec<u8>) -> ServiceResult<()> {
        self.keys.lock().await.push(key.to_string());
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("https://images.test/{}", key)
    }
}

pub struct TestEnvironment {
    pub client: Client,
    pub base_url: String,
    pub images: Arc<StubImageStore>,
}

impl TestEnvironment {
    pub async fn new() -> Self {
        let images = Arc::new(StubImageStore::default());
        let metrics = Arc::new(Metrics::new().expect("Failed to create metrics"));

        let state = AppState::new(
            Arc::new(InMemoryCategoryRepository::new()),
            Arc::new(InMemoryItemRepository::new()),
            images.clone(),
            None,
            metrics,
            AppSettings {
                restaurant_id: "test-restaurant".to_string(),
                admin_password: ADMIN_PASSWORD.to_string(),
                image_key_prefix: "test".to_string(),
                cookie_secure: false,
                tables: TableNames {
                    categories: "TestCategories".to_string(),
                    items: "TestItems".to_string(),
                    prices: "TestPrices".to_string(),
                },
            },
        );
        let app = create_app(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind listener");
        let addr = listener.local_addr().expect("Failed to get local address");
        let base_url = format!("http://{}", addr);

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Failed to serve app");
        });

        // Wait for server to start
        tokio::time::sleep(Duration::from_millis(100)).await;

        let client = Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to build client");

        Self {
            client,
            base_url,
            images,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Log in and keep the session cookie in the client's jar
    pub async fn login(&self) {
        let response = self
            .client
            .post(self.url("/api/admin/login"))
            .json(&json!({ "password": ADMIN_PASSWORD }))
            .send()
            .await
            .expect("Failed to log in");
        assert_eq!(response.status().as_u16(), 200);
    }

    pub async fn create_category(&self, kind: &str, name_en: &str, name_mr: &str) -> Value {
        let response = self
            .client
            .post(self.url(&format!("/api/admin/{}/categories", kind)))
            .json(&json!({ "name_en": name_en, "name_mr": name_mr }))
            .send()
            .await
            .expect("Failed to create category");
        assert_eq!(response.status().as_u16(), 201);
        response.json().await.expect("Failed to parse category")
    }

    pub async fn create_item(&self, kind: &str, body: Value) -> Value {
        let response = self
            .client
            .post(self.url(&format!("/api/admin/{}/items", kind)))
            .json(&body)
            .send()
            .await
            .expect("Failed to create item");
        assert_eq!(response.status().as_u16(), 201);
        response.json().await.expect("Failed to parse item")
    }

    pub async fn public_menu(&self, kind: &str, query: &str) -> Value {
        let response = self
            .client
            .get(self.url(&format!("/api/menu/{}{}", kind, query)))
            .send()
            .await
            .expect("Failed to fetch menu");
        assert_eq!(response.status().as_u16(), 200);
        response.json().await.expect("Failed to parse menu")
    }
}

/// Item names of every section, in display order
pub fn menu_item_names(menu: &Value) -> Vec<String> {
    menu["sections"]
        .as_array()
        .expect("Expected sections array")
        .iter()
        .flat_map(|section| section["items"].as_array().cloned().unwrap_or_default())
        .filter_map(|item| item["name"].as_str().map(str::to_string))
        .collect()
}
