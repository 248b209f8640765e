//! Operation execution
//!
//! Each [`Operation`] becomes one or two object store calls. GET, PUT and
//! DELETE pass the backend response through as-is, failure statuses
//! included. MOVE is copy-then-delete and reports 201 only when both steps
//! succeed.
//!
//! MOVE has no rollback: if the copy lands and the delete fails, the object
//! exists under both keys and the caller sees a backend failure.

use bytes::Bytes;
use tracing::{error, info};

use super::operation::Operation;
use crate::error::{Error, Result};
use crate::storage::{ObjectStore, StorageResponse};

/// Run an operation against the store
pub async fn execute(store: &dyn ObjectStore, op: Operation) -> Result<StorageResponse> {
    let success = op.success_code();

    match op {
        Operation::Get { key } => store.get_object(key.as_str()).await,
        Operation::Delete { key } => {
            let response = store.delete_object(key.as_str()).await?;
            info!("DELETE {} -> {}", key, response.status);
            Ok(response)
        }
        Operation::Put { key, body } => {
            let size = body.len();
            let response = store.put_object(key.as_str(), body).await?;
            info!("PUT {} ({} bytes) -> {}", key, size, response.status);
            Ok(response)
        }
        Operation::Move { from, to } => {
            if from == to {
                info!("MOVE {} onto itself, nothing to do", from);
                return Ok(StorageResponse::new(success, Bytes::new()));
            }

            let copied = store.copy_object(from.as_str(), to.as_str()).await?;
            if !copied.is_success() {
                return Err(Error::Storage(format!(
                    "copy {} -> {} returned {}",
                    from, to, copied.status
                )));
            }

            let deleted = match store.delete_object(from.as_str()).await {
                Ok(response) => response,
                Err(e) => {
                    error!("MOVE {} -> {}: copied but source delete failed, object now exists under both keys", from, to);
                    return Err(e);
                }
            };
            if !deleted.is_success() {
                error!("MOVE {} -> {}: copied but source delete returned {}, object now exists under both keys", from, to, deleted.status);
                return Err(Error::Storage(format!(
                    "delete {} returned {}",
                    from, deleted.status
                )));
            }

            info!("MOVE {} -> {}", from, to);
            Ok(StorageResponse::new(success, Bytes::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dav::operation::ObjectKey;
    use crate::storage::{MemoryStore, StoreCall};

    fn key(s: &str) -> ObjectKey {
        ObjectKey::new(s).unwrap()
    }

    fn move_op(from: &str, to: &str) -> Operation {
        Operation::Move { from: key(from), to: key(to) }
    }

    #[tokio::test]
    async fn test_get_passes_through_404() {
        let store = MemoryStore::new();
        let response = execute(&store, Operation::Get { key: key("missing.txt") })
            .await
            .unwrap();
        assert_eq!(response.status, 404);
    }

    #[tokio::test]
    async fn test_put_stores_body() {
        let store = MemoryStore::new();
        let response = execute(
            &store,
            Operation::Put { key: key("x.txt"), body: Bytes::from_static(b"hello") },
        )
        .await
        .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(
            store.calls().await,
            vec![StoreCall::Put { key: "x.txt".into(), body: Bytes::from_static(b"hello") }]
        );
    }

    #[tokio::test]
    async fn test_move_copies_then_deletes() {
        let store = MemoryStore::new();
        store.insert("a.txt", "data").await;

        let response = execute(&store, move_op("a.txt", "b.txt")).await.unwrap();

        assert_eq!(response.status, 201);
        assert!(response.body.is_empty());
        assert_eq!(
            store.calls().await,
            vec![
                StoreCall::Copy { from: "a.txt".into(), to: "b.txt".into() },
                StoreCall::Delete { key: "a.txt".into() },
            ]
        );
        assert_eq!(store.object("b.txt").await, Some(Bytes::from_static(b"data")));
        assert_eq!(store.object("a.txt").await, None);
    }

    #[tokio::test]
    async fn test_move_copy_failure_skips_delete() {
        let store = MemoryStore::new();
        store.insert("a.txt", "data").await;
        store.fail_on("copy").await;

        assert!(execute(&store, move_op("a.txt", "b.txt")).await.is_err());
        assert_eq!(
            store.calls().await,
            vec![StoreCall::Copy { from: "a.txt".into(), to: "b.txt".into() }]
        );
        assert!(store.object("a.txt").await.is_some());
    }

    #[tokio::test]
    async fn test_move_missing_source_is_failure() {
        let store = MemoryStore::new();

        let err = execute(&store, move_op("a.txt", "b.txt")).await.unwrap_err();
        assert!(err.is_backend_failure());
        assert_eq!(store.calls().await.len(), 1);
    }

    #[tokio::test]
    async fn test_move_delete_failure_leaves_both_copies() {
        let store = MemoryStore::new();
        store.insert("a.txt", "data").await;
        store.fail_on("delete").await;

        assert!(execute(&store, move_op("a.txt", "b.txt")).await.is_err());
        assert!(store.object("a.txt").await.is_some());
        assert!(store.object("b.txt").await.is_some());
    }

    #[tokio::test]
    async fn test_move_onto_itself() {
        let store = MemoryStore::new();
        store.insert("a.txt", "data").await;

        let response = execute(&store, move_op("a.txt", "a.txt")).await.unwrap();
        assert_eq!(response.status, 201);
        assert!(store.calls().await.is_empty());
        assert!(store.object("a.txt").await.is_some());
    }
}
