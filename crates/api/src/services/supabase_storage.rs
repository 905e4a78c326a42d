//! Supabase Storage provider.
//!
//! Objects are written with the service-role key through the Storage REST
//! API. The locator returned for an upload is the object path inside the
//! bucket.

use std::time::Duration;

use async_trait::async_trait;
use domain::services::{StorageError, StorageProvider};
use reqwest::{header, Client};
use serde_json::json;
use tracing::{debug, warn};

use crate::config::StorageConfig;

/// Storage provider backed by a Supabase Storage bucket.
pub struct SupabaseStorage {
    client: Client,
    base_url: String,
    service_key: String,
    bucket: String,
}

impl SupabaseStorage {
    pub fn new(config: &StorageConfig) -> Result<Self, StorageError> {
        if config.supabase_url.is_empty() || config.supabase_service_key.is_empty() {
            return Err(StorageError::NotConfigured(
                "supabase_url and supabase_service_key are required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| StorageError::Http(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            service_key: config.supabase_service_key.clone(),
            bucket: config.supabase_bucket.clone(),
        })
    }

    fn object_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url,
            self.bucket,
            path.trim_start_matches('/')
        )
    }

    fn bucket_url(&self) -> String {
        format!("{}/storage/v1/object/{}", self.base_url, self.bucket)
    }
}

#[async_trait]
impl StorageProvider for SupabaseStorage {
    fn name(&self) -> &'static str {
        "supabase"
    }

    async fn upload_file(
        &self,
        data: &[u8],
        content_type: &str,
        path: &str,
    ) -> Result<String, StorageError> {
        let response = self
            .client
            .post(self.object_url(path))
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .header(header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(data.to_vec())
            .send()
            .await
            .map_err(|e| StorageError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StorageError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        debug!(bucket = %self.bucket, path = %path, size = data.len(), "Uploaded object to Supabase");
        Ok(path.to_string())
    }

    async fn delete_file(&self, path: &str) -> Result<(), StorageError> {
        // Supabase locators are the object paths themselves.
        let response = self
            .client
            .delete(self.bucket_url())
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .json(&json!({ "prefixes": [path] }))
            .send()
            .await
            .map_err(|e| StorageError::Http(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(StorageError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(path = %path, status = status.as_u16(), "Supabase delete rejected");
            return Err(StorageError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}
