//! FlatDAV - WebDAV Gateway for Flat Object Storage
//!
//! Lets legacy WebDAV clients read, write, delete and rename objects stored
//! in a single bucket with no directory hierarchy.
//!
//! # Architecture
//!
//! Each request is handled independently in one linear pass: check the
//! static Basic credential, parse the request into a typed operation,
//! execute it against the object store, and translate the store's response
//! back into HTTP. The store client and the credential are built once at
//! startup and shared read-only by all requests.
//!
//! # Features
//!
//! - GET, PUT and DELETE mapped 1:1 onto object store calls, backend status
//!   passed through
//! - MOVE as copy-then-delete, restricted to renames within one collection
//! - S3 backend with support for self-hosted, path-style endpoints
//! - Configuration from environment variables or a TOML file

pub mod config;
pub mod dav;
pub mod error;
pub mod storage;

pub use config::FlatDavConfig;
pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::FlatDavConfig;
    pub use crate::dav::{BasicAuth, DavServer, DavState, Operation, ParseFailure};
    pub use crate::error::{Error, Result};
    pub use crate::storage::{ObjectStore, S3Store, StorageResponse};

    #[cfg(any(test, feature = "integration"))]
    pub use crate::storage::MemoryStore;
}
