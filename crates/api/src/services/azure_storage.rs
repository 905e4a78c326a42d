//! Azure Blob Storage provider.
//!
//! Requests are authorized with the storage account's Shared Key: every
//! request carries an HMAC-SHA256 signature over its canonical form.
//! The locator returned for an upload is the blob URL.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use domain::services::{StorageError, StorageProvider};
use reqwest::{header, Client, Method};
use tracing::debug;

use crate::config::StorageConfig;

/// Blob service REST API version used for every request.
const API_VERSION: &str = "2021-08-06";

/// Account details parsed from an Azure Storage connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AzureAccount {
    pub name: String,
    /// Base64-encoded account key.
    pub key: String,
    /// Blob endpoint without trailing slash.
    pub blob_endpoint: String,
}

impl AzureAccount {
    /// Parses `Key=Value;` pairs. `BlobEndpoint` wins over the endpoint
    /// derived from protocol, account name and suffix.
    pub fn from_connection_string(conn: &str) -> Result<Self, StorageError> {
        let pairs: HashMap<&str, &str> = conn
            .split(';')
            .filter_map(|part| part.trim().split_once('='))
            .collect();

        let name = pairs
            .get("AccountName")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| StorageError::NotConfigured("AccountName missing".to_string()))?;
        let key = pairs
            .get("AccountKey")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| StorageError::NotConfigured("AccountKey missing".to_string()))?;

        let blob_endpoint = match pairs.get("BlobEndpoint") {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => {
                let protocol = pairs.get("DefaultEndpointsProtocol").unwrap_or(&"https");
                let suffix = pairs.get("EndpointSuffix").unwrap_or(&"core.windows.net");
                format!("{}://{}.blob.{}", protocol, name, suffix)
            }
        };

        Ok(Self {
            name: name.to_string(),
            key: key.to_string(),
            blob_endpoint,
        })
    }
}

/// Builds the Shared Key string-to-sign for a blob request without query
/// parameters. `ms_headers` must contain every `x-ms-*` header sent.
pub fn string_to_sign(
    method: &str,
    content_length: usize,
    content_type: &str,
    ms_headers: &[(&str, &str)],
    account: &str,
    resource_path: &str,
) -> String {
    let length = if content_length == 0 {
        String::new()
    } else {
        content_length.to_string()
    };

    let mut headers: Vec<(String, &str)> = ms_headers
        .iter()
        .map(|(k, v)| (k.to_ascii_lowercase(), v.trim()))
        .collect();
    headers.sort_by(|a, b| a.0.cmp(&b.0));
    let canonical_headers: String = headers
        .iter()
        .map(|(k, v)| format!("{}:{}\n", k, v))
        .collect();

    // Encoding, Language, Length, MD5, Type, Date, If-Modified-Since,
    // If-Match, If-None-Match, If-Unmodified-Since, Range.
    format!(
        "{}\n\n\n{}\n\n{}\n\n\n\n\n\n\n{}/{}{}",
        method, length, content_type, canonical_headers, account, resource_path
    )
}

/// Storage provider backed by an Azure Blob Storage container.
pub struct AzureBlobStorage {
    client: Client,
    account: AzureAccount,
    container: String,
}

impl AzureBlobStorage {
    pub fn new(config: &StorageConfig) -> Result<Self, StorageError> {
        let account = AzureAccount::from_connection_string(&config.azure_connection_string)?;
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| StorageError::Http(e.to_string()))?;

        Ok(Self {
            client,
            account,
            container: config.azure_container.clone(),
        })
    }

    fn resource_path(&self, path: &str) -> String {
        format!("/{}/{}", self.container, path.trim_start_matches('/'))
    }

    fn blob_url(&self, path: &str) -> String {
        format!("{}{}", self.account.blob_endpoint, self.resource_path(path))
    }

    /// Maps a blob URL returned by `upload_file` back to its path.
    fn path_from_locator<'a>(&self, locator: &'a str) -> &'a str {
        let prefix = format!("{}/{}/", self.account.blob_endpoint, self.container);
        locator.strip_prefix(prefix.as_str()).unwrap_or(locator)
    }

    async fn send_signed(
        &self,
        method: Method,
        path: &str,
        content_type: &str,
        body: Option<&[u8]>,
    ) -> Result<reqwest::Response, StorageError> {
        let date = Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string();
        let content_length = body.map(<[u8]>::len).unwrap_or(0);
        let is_put = method == Method::PUT;

        let mut ms_headers = vec![("x-ms-date", date.as_str()), ("x-ms-version", API_VERSION)];
        if is_put {
            ms_headers.push(("x-ms-blob-type", "BlockBlob"));
        }

        let to_sign = string_to_sign(
            method.as_str(),
            content_length,
            content_type,
            &ms_headers,
            &self.account.name,
            &self.resource_path(path),
        );
        let signature = shared::crypto::hmac_sha256_base64(&self.account.key, &to_sign)
            .ok_or_else(|| StorageError::NotConfigured("AccountKey is not valid base64".into()))?;

        let mut request = self
            .client
            .request(method, self.blob_url(path))
            .header(
                header::AUTHORIZATION,
                format!("SharedKey {}:{}", self.account.name, signature),
            );
        for (name, value) in &ms_headers {
            request = request.header(*name, *value);
        }
        if !content_type.is_empty() {
            request = request.header(header::CONTENT_TYPE, content_type);
        }
        if let Some(bytes) = body {
            request = request
                .header(header::CONTENT_LENGTH, bytes.len())
                .body(bytes.to_vec());
        }

        request
            .send()
            .await
            .map_err(|e| StorageError::Http(e.to_string()))
    }
}

#[async_trait]
impl StorageProvider for AzureBlobStorage {
    fn name(&self) -> &'static str {
        "azure"
    }

    async fn upload_file(
        &self,
        data: &[u8],
        content_type: &str,
        path: &str,
    ) -> Result<String, StorageError> {
        let response = self
            .send_signed(Method::PUT, path, content_type, Some(data))
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StorageError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        debug!(container = %self.container, path = %path, size = data.len(), "Uploaded blob to Azure");
        Ok(self.blob_url(path))
    }

    async fn delete_file(&self, locator: &str) -> Result<(), StorageError> {
        let path = self.path_from_locator(locator);
        let response = self.send_signed(Method::DELETE, path, "", None).await?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(StorageError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StorageError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONN: &str = "DefaultEndpointsProtocol=https;AccountName=memoriz;AccountKey=a2V5;EndpointSuffix=core.windows.net";

    #[test]
    fn test_parse_connection_string() {
        let account = AzureAccount::from_connection_string(CONN).unwrap();
        assert_eq!(account.name, "memoriz");
        assert_eq!(account.key, "a2V5");
        assert_eq!(account.blob_endpoint, "https://memoriz.blob.core.windows.net");
    }

    #[test]
    fn test_parse_connection_string_with_blob_endpoint() {
        let account = AzureAccount::from_connection_string(
            "AccountName=devstoreaccount1;AccountKey=a2V5;BlobEndpoint=http://127.0.0.1:10000/devstoreaccount1/",
        )
        .unwrap();
        assert_eq!(account.blob_endpoint, "http://127.0.0.1:10000/devstoreaccount1");
    }

    #[test]
    fn test_parse_connection_string_missing_key() {
        assert!(AzureAccount::from_connection_string("AccountName=x").is_err());
        assert!(AzureAccount::from_connection_string("").is_err());
    }

    #[test]
    fn test_string_to_sign_put() {
        let s = string_to_sign(
            "PUT",
            11,
            "image/jpeg",
            &[
                ("x-ms-version", "2021-08-06"),
                ("x-ms-date", "Mon, 01 Jun 2026 12:00:00 GMT"),
                ("x-ms-blob-type", "BlockBlob"),
            ],
            "memoriz",
            "/event-uploads/events/e1/1-a.jpg",
        );
        let expected = "PUT\n\n\n11\n\nimage/jpeg\n\n\n\n\n\n\n\
            x-ms-blob-type:BlockBlob\n\
            x-ms-date:Mon, 01 Jun 2026 12:00:00 GMT\n\
            x-ms-version:2021-08-06\n\
            /memoriz/event-uploads/events/e1/1-a.jpg";
        assert_eq!(s, expected);
    }

    #[test]
    fn test_string_to_sign_delete_has_empty_length() {
        let s = string_to_sign(
            "DELETE",
            0,
            "",
            &[("x-ms-date", "d"), ("x-ms-version", "v")],
            "acct",
            "/c/p",
        );
        assert!(s.starts_with("DELETE\n\n\n\n\n\n"));
        assert!(s.ends_with("x-ms-date:d\nx-ms-version:v\n/acct/c/p"));
    }

    #[test]
    fn test_blob_url() {
        let config = StorageConfig {
            provider: "azure".to_string(),
            supabase_url: String::new(),
            supabase_service_key: String::new(),
            supabase_bucket: "uploads".to_string(),
            azure_connection_string: CONN.to_string(),
            azure_container: "event-uploads".to_string(),
            timeout_ms: 1000,
        };
        let storage = AzureBlobStorage::new(&config).unwrap();
        let url = storage.blob_url("events/e1/1-a.jpg");
        assert_eq!(
            url,
            "https://memoriz.blob.core.windows.net/event-uploads/events/e1/1-a.jpg"
        );
        assert_eq!(storage.path_from_locator(&url), "events/e1/1-a.jpg");
        assert_eq!(storage.path_from_locator("events/e1/1-a.jpg"), "events/e1/1-a.jpg");
    }
}
