use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, instrument, Instrument};
use uuid::Uuid;

use crate::models::{validate_upload, ServiceError, ServiceResult, UploadKind};

/// Object storage for menu images
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store `bytes` under `key`
    async fn put(&self, key: &str, content_type: &str, bytes: Vec<u8>) -> ServiceResult<()>;

    /// Public URL under which `key` is served
    fn public_url(&self, key: &str) -> String;
}

/// S3-compatible store (AWS S3, Cloudflare R2, MinIO)
pub struct S3ImageStore {
    client: S3Client,
    bucket: String,
    public_base_url: String,
}

impl S3ImageStore {
    pub fn new(client: S3Client, bucket: String, public_base_url: String) -> Self {
        Self {
            client,
            bucket,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn span(&self, key: &str) -> tracing::Span {
        tracing::info_span!(
            "S3",
            "aws.service" = "S3",
            "aws.operation" = "PutObject",
            "aws.s3.bucket" = %self.bucket,
            "aws.s3.key" = %key,
            "otel.kind" = "client",
            "otel.name" = "S3.PutObject",
            "rpc.system" = "aws-api",
            "rpc.service" = "S3",
            "rpc.method" = "PutObject",
        )
    }
}

#[async_trait]
impl ImageStore for S3ImageStore {
    async fn put(&self, key: &str, content_type: &str, bytes: Vec<u8>) -> ServiceResult<()> {
        async {
            self.client
                .put_object()
                .bucket(&self.bucket)
                .key(key)
                .body(bytes.into())
                .content_type(content_type)
                .send()
                .await
                .map_err(|e| {
                    error!(key = %key, error = %e, "S3 upload failed");
                    ServiceError::ExternalService {
                        service: "s3".to_string(),
                        message: e.to_string(),
                    }
                })
        }
        .instrument(self.span(key))
        .await?;
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}

/// Returned to the admin form after a successful upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
    pub key: String,
}

/// Validates uploads and files them under `{prefix}/{kind}/{id}.{ext}`
pub struct UploadService {
    store: Arc<dyn ImageStore>,
    key_prefix: String,
}

impl UploadService {
    pub fn new(store: Arc<dyn ImageStore>, key_prefix: String) -> Self {
        Self {
            store,
            key_prefix: key_prefix.trim_matches('/').to_string(),
        }
    }

    #[instrument(skip(self, bytes), fields(kind = %kind, size = bytes.len()))]
    pub async fn upload(
        &self,
        kind: UploadKind,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> ServiceResult<UploadResponse> {
        validate_upload(content_type, bytes.len()).map_err(|e| ServiceError::Upload {
            message: e.to_string(),
        })?;

        let key = object_key(&self.key_prefix, kind, file_name, content_type);
        self.store.put(&key, content_type, bytes).await?;

        let url = self.store.public_url(&key);
        crate::info_with_trace!(key = %key, "Image uploaded");
        Ok(UploadResponse { url, key })
    }
}

/// File extension taken from the upload name, or the content subtype when the name has none
pub fn file_extension(file_name: &str, content_type: &str) -> String {
    let from_name = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()));
    let from_type = content_type
        .strip_prefix("image/")
        .map(|subtype| subtype.split(['+', ';']).next().unwrap_or(subtype))
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    from_name
        .or(from_type)
        .unwrap_or("bin")
        .to_ascii_lowercase()
}

pub fn object_key(prefix: &str, kind: UploadKind, file_name: &str, content_type: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    let short_id = id.get(0..8).unwrap_or(&id);
    let extension = file_extension(file_name, content_type);
    if prefix.is_empty() {
        format!("{}/{}.{}", kind, short_id, extension)
    } else {
        format!("{}/{}/{}.{}", prefix, kind, short_id, extension)
    }
}
