//! In-memory object store
//!
//! Mirrors the status codes S3 returns for the four primitives and records
//! every call it receives, so request handling can be exercised without a
//! running backend.

use std::collections::{HashMap, HashSet};

use bytes::Bytes;
use tokio::sync::Mutex;

use super::{ObjectStore, StorageResponse};
use crate::error::{Error, Result};

/// A backend call as received by the store
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StoreCall {
    Get { key: String },
    Put { key: String, body: Bytes },
    Delete { key: String },
    Copy { from: String, to: String },
}

impl StoreCall {
    fn kind(&self) -> &'static str {
        match self {
            StoreCall::Get { .. } => "get",
            StoreCall::Put { .. } => "put",
            StoreCall::Delete { .. } => "delete",
            StoreCall::Copy { .. } => "copy",
        }
    }
}

#[derive(Default)]
struct Inner {
    objects: HashMap<String, Bytes>,
    calls: Vec<StoreCall>,
    failing: HashSet<&'static str>,
}

/// Object store held entirely in memory
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an object directly, bypassing call recording
    pub async fn insert(&self, key: impl Into<String>, body: impl Into<Bytes>) {
        self.inner.lock().await.objects.insert(key.into(), body.into());
    }

    /// Read an object directly, bypassing call recording
    pub async fn object(&self, key: &str) -> Option<Bytes> {
        self.inner.lock().await.objects.get(key).cloned()
    }

    /// Calls received so far, in order
    pub async fn calls(&self) -> Vec<StoreCall> {
        self.inner.lock().await.calls.clone()
    }

    /// Make every future call of this kind ("get", "put", "delete", "copy")
    /// fail as if the backend were unreachable
    pub async fn fail_on(&self, kind: &'static str) {
        self.inner.lock().await.failing.insert(kind);
    }

    async fn record(&self, call: StoreCall) -> Result<tokio::sync::MutexGuard<'_, Inner>> {
        let mut inner = self.inner.lock().await;
        let kind = call.kind();
        inner.calls.push(call);
        if inner.failing.contains(kind) {
            return Err(Error::Network(format!("injected {} failure", kind)));
        }
        Ok(inner)
    }
}

fn no_such_key(key: &str) -> StorageResponse {
    let xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <Error><Code>NoSuchKey</Code><Message>The specified key does not exist.</Message><Key>{}</Key></Error>",
        key
    );
    StorageResponse::new(404, xml).with_header("content-type", "application/xml")
}

#[async_trait::async_trait]
impl ObjectStore for MemoryStore {
    async fn get_object(&self, key: &str) -> Result<StorageResponse> {
        let inner = self.record(StoreCall::Get { key: key.to_string() }).await?;
        Ok(match inner.objects.get(key) {
            Some(body) => StorageResponse::new(200, body.clone())
                .with_header("content-type", "application/octet-stream"),
            None => no_such_key(key),
        })
    }

    async fn put_object(&self, key: &str, body: Bytes) -> Result<StorageResponse> {
        let mut inner = self
            .record(StoreCall::Put {
                key: key.to_string(),
                body: body.clone(),
            })
            .await?;
        inner.objects.insert(key.to_string(), body);
        Ok(StorageResponse::new(200, Bytes::new()))
    }

    async fn delete_object(&self, key: &str) -> Result<StorageResponse> {
        let mut inner = self.record(StoreCall::Delete { key: key.to_string() }).await?;
        inner.objects.remove(key);
        Ok(StorageResponse::new(204, Bytes::new()))
    }

    async fn copy_object(&self, from: &str, to: &str) -> Result<StorageResponse> {
        let mut inner = self
            .record(StoreCall::Copy {
                from: from.to_string(),
                to: to.to_string(),
            })
            .await?;
        match inner.objects.get(from).cloned() {
            Some(body) => {
                inner.objects.insert(to.to_string(), body);
                Ok(StorageResponse::new(200, Bytes::new()))
            }
            None => Ok(no_such_key(from)),
        }
    }
}
