//! Basic authentication
//!
//! One static credential for every client. The expected `Authorization`
//! value is computed once at startup and compared by exact string equality.

use axum::http::{header, HeaderMap};

use crate::config::AuthConfig;

/// The precomputed Basic credential
#[derive(Clone)]
pub struct BasicAuth {
    expected: String,
    realm: String,
}

impl BasicAuth {
    /// Build from configuration
    pub fn new(config: &AuthConfig, realm: impl Into<String>) -> Self {
        Self {
            expected: config.header_value(),
            realm: realm.into(),
        }
    }

    /// Check an `Authorization` header value
    pub fn check(&self, authorization: Option<&str>) -> bool {
        match authorization {
            Some(value) => value == self.expected,
            None => false,
        }
    }

    /// Check the `Authorization` header of a request
    pub fn authorize(&self, headers: &HeaderMap) -> bool {
        let value = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        self.check(value)
    }

    /// Value for `WWW-Authenticate` on a 401
    pub fn challenge(&self) -> String {
        format!("Basic realm=\"{}\"", self.realm)
    }
}

impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth")
            .field("realm", &self.realm)
            .finish_non_exhaustive()
    }
}
