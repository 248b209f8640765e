//! Object Storage Module
//!
//! The flat-namespace backend the gateway translates into. Every object is
//! addressed by a single key inside one bucket.

#[cfg(any(test, feature = "integration"))]
mod memory;
mod s3_store;

#[cfg(any(test, feature = "integration"))]
pub use memory::{MemoryStore, StoreCall};
pub use s3_store::S3Store;

use std::collections::HashMap;

use bytes::Bytes;

use crate::error::Result;

/// Response from the object store, normalized across backends.
///
/// Failure statuses returned by the backend (e.g. 404 for a missing key) are
/// carried here as ordinary responses. Only transport failures become `Err`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl StorageResponse {
    /// Create a response with no headers
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// Add a header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Check for a 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Object store primitives used by the executor
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Retrieve an object
    async fn get_object(&self, key: &str) -> Result<StorageResponse>;

    /// Store an object, replacing any existing one
    async fn put_object(&self, key: &str, body: Bytes) -> Result<StorageResponse>;

    /// Delete an object
    async fn delete_object(&self, key: &str) -> Result<StorageResponse>;

    /// Copy an object to a new key within the same bucket
    async fn copy_object(&self, from: &str, to: &str) -> Result<StorageResponse>;
}
