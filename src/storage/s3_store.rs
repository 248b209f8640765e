//! S3 backend
//!
//! Built with `default-features = false`, so the client hands back non-2xx
//! responses as data instead of errors. Backend statuses pass through to the
//! WebDAV client untouched.

use bytes::Bytes;
use s3::creds::Credentials;
use s3::request::ResponseData;
use s3::{Bucket, Region};
use tracing::{debug, info};

use super::{ObjectStore, StorageResponse};
use crate::config::StorageConfig;
use crate::error::{Error, Result};

/// Object store backed by a single S3 bucket
pub struct S3Store {
    bucket: Box<Bucket>,
}

impl S3Store {
    /// Build the bucket client from configuration
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        let credentials = match (&config.access_key, &config.secret_key) {
            (Some(access_key), Some(secret_key)) => Credentials::new(
                Some(access_key.as_str()),
                Some(secret_key.as_str()),
                None,
                config.session_token.as_deref(),
                None,
            ),
            _ => Credentials::default(),
        }
        .map_err(|e| Error::Config(format!("Failed to load storage credentials: {}", e)))?;

        let region = match config.endpoint_url() {
            Some(endpoint) => Region::Custom {
                region: config.region.clone(),
                endpoint,
            },
            None => Region::Custom {
                region: config.region.clone(),
                endpoint: format!("https://s3.{}.amazonaws.com", config.region),
            },
        };

        let mut bucket = Bucket::new(&config.bucket, region, credentials)?;
        if config.path_style() {
            bucket = bucket.with_path_style();
        }

        info!(
            "Object store: bucket '{}' in {} ({})",
            config.bucket,
            config.region,
            config.endpoint_url().unwrap_or_else(|| "AWS".to_string())
        );

        Ok(Self { bucket })
    }

    /// Name of the bucket being served
    pub fn bucket_name(&self) -> String {
        self.bucket.name()
    }
}

/// Percent-encode a key for `x-amz-copy-source`.
///
/// The client places the source key in the header verbatim and S3 decodes
/// it, so non-ASCII bytes and `%`, `+`, `?` must be escaped.
fn copy_source_key(key: &str) -> String {
    urlencoding::encode(key).into_owned()
}

fn normalize(response: ResponseData) -> StorageResponse {
    StorageResponse {
        status: response.status_code(),
        headers: response.headers(),
        body: response.bytes().clone(),
    }
}

#[async_trait::async_trait]
impl ObjectStore for S3Store {
    async fn get_object(&self, key: &str) -> Result<StorageResponse> {
        let response = self.bucket.get_object(key).await?;
        debug!("S3 GetObject {} -> {}", key, response.status_code());
        Ok(normalize(response))
    }

    async fn put_object(&self, key: &str, body: Bytes) -> Result<StorageResponse> {
        let response = self.bucket.put_object(key, &body).await?;
        debug!("S3 PutObject {} ({} bytes) -> {}", key, body.len(), response.status_code());
        Ok(normalize(response))
    }

    async fn delete_object(&self, key: &str) -> Result<StorageResponse> {
        let response = self.bucket.delete_object(key).await?;
        debug!("S3 DeleteObject {} -> {}", key, response.status_code());
        Ok(normalize(response))
    }

    async fn copy_object(&self, from: &str, to: &str) -> Result<StorageResponse> {
        let source = copy_source_key(from);
        let status = self.bucket.copy_object_internal(&source, to).await?;
        debug!("S3 CopyObject {} -> {}: {}", from, to, status);
        Ok(StorageResponse::new(status, Bytes::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_copy_source_key_plain() {
        assert_eq!(copy_source_key("notes.txt"), "notes.txt");
        assert_eq!(copy_source_key("my file.txt"), "my%20file.txt");
    }

    #[test]
    fn test_copy_source_key_escapes_non_ascii() {
        let source = copy_source_key("résumé.kdbx");
        assert_eq!(source, "r%C3%A9sum%C3%A9.kdbx");
        assert!(HeaderValue::from_str(&format!("bucket/{}", source)).is_ok());
    }

    #[test]
    fn test_copy_source_key_escapes_reserved() {
        assert_eq!(copy_source_key("a+b%c?.txt"), "a%2Bb%25c%3F.txt");
    }

    #[test]
    fn test_from_config_custom_endpoint() {
        let config = StorageConfig {
            bucket: "documents".to_string(),
            endpoint: Some("localhost:9000".to_string()),
            access_key: Some("minio".to_string()),
            secret_key: Some("minio123".to_string()),
            ..StorageConfig::default()
        };

        let store = S3Store::from_config(&config).unwrap();
        assert_eq!(store.bucket_name(), "documents");
    }
}
