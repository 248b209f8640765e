//! Request parsing
//!
//! Turns an inbound request into a typed [`Operation`]. Parsing never touches
//! the backend.

use std::fmt;

use axum::http::{HeaderMap, Method};
use bytes::Bytes;

use super::destination::resolve_destination;

/// WebDAV header naming the target of a MOVE
pub const DESTINATION: &str = "destination";

/// Object key in the flat namespace: non-empty, no `/`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Validate a key
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        if key.is_empty() || key.contains('/') {
            None
        } else {
            Some(Self(key))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Supported methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Delete,
    Put,
    Move,
}

impl Verb {
    /// Every supported verb, in the order advertised by `Allow`
    pub const ALL: [Verb; 4] = [Verb::Get, Verb::Put, Verb::Delete, Verb::Move];

    /// Map an HTTP method to a verb
    pub fn from_method(method: &Method) -> Option<Self> {
        match method.as_str() {
            "GET" => Some(Verb::Get),
            "DELETE" => Some(Verb::Delete),
            "PUT" => Some(Verb::Put),
            "MOVE" => Some(Verb::Move),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Delete => "DELETE",
            Verb::Put => "PUT",
            Verb::Move => "MOVE",
        }
    }

    /// Value for the `Allow` header
    pub fn allow_header() -> String {
        Verb::ALL
            .iter()
            .map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A parsed request, one variant per verb
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Get { key: ObjectKey },
    Delete { key: ObjectKey },
    Put { key: ObjectKey, body: Bytes },
    Move { from: ObjectKey, to: ObjectKey },
}

impl Operation {
    pub fn verb(&self) -> Verb {
        match self {
            Operation::Get { .. } => Verb::Get,
            Operation::Delete { .. } => Verb::Delete,
            Operation::Put { .. } => Verb::Put,
            Operation::Move { .. } => Verb::Move,
        }
    }

    /// Status the backend normally reports when the operation succeeds
    pub fn success_code(&self) -> u16 {
        match self {
            Operation::Get { .. } | Operation::Delete { .. } | Operation::Put { .. } => 200,
            Operation::Move { .. } => 201,
        }
    }
}

/// Why a request could not be turned into an [`Operation`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseFailure {
    UnsupportedMethod,
    MalformedDestinationHeader,
    InvalidKey,
}

/// Parse a request.
///
/// `path_key` is the decoded key matched from the route; `request_url` is the
/// original request URL used to validate a MOVE destination. The body is kept
/// as raw bytes for PUT and ignored otherwise.
pub fn parse_operation(
    method: &Method,
    path_key: &str,
    headers: &HeaderMap,
    request_url: &str,
    body: Bytes,
) -> Result<Operation, ParseFailure> {
    let verb = Verb::from_method(method).ok_or(ParseFailure::UnsupportedMethod)?;
    let key = ObjectKey::new(path_key).ok_or(ParseFailure::InvalidKey)?;

    match verb {
        Verb::Get => Ok(Operation::Get { key }),
        Verb::Delete => Ok(Operation::Delete { key }),
        Verb::Put => Ok(Operation::Put { key, body }),
        Verb::Move => {
            let destination = headers
                .get(DESTINATION)
                .and_then(|v| v.to_str().ok());
            let raw = resolve_destination(destination, request_url)
                .ok_or(ParseFailure::MalformedDestinationHeader)?;
            let to = urlencoding::decode(&raw)
                .ok()
                .and_then(|decoded| ObjectKey::new(decoded.into_owned()))
                .ok_or(ParseFailure::MalformedDestinationHeader)?;
            Ok(Operation::Move { from: key, to })
        }
    }
}
