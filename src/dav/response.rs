//! Storage response to HTTP response

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::storage::StorageResponse;

/// Headers describing the backend connection rather than the object
const SKIPPED_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "content-length",
];

/// Convert a storage response into the outbound HTTP response.
///
/// Status, headers and body are copied across. The body is sent as raw bytes.
pub fn to_http_response(storage: StorageResponse) -> Response {
    let status = StatusCode::from_u16(storage.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut response = (status, Body::from(storage.body)).into_response();

    let headers = response.headers_mut();
    for (name, value) in &storage.headers {
        if SKIPPED_HEADERS.contains(&name.to_ascii_lowercase().as_str()) {
            continue;
        }
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.append(name, value);
            }
            _ => debug!("Dropping backend header {}: {}", name, value),
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_fields_copied() {
        let storage = StorageResponse::new(200, "hello")
            .with_header("ETag", "\"abc\"")
            .with_header("Content-Type", "text/plain");

        let response = to_http_response(storage);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::ETAG], "\"abc\"");
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"hello");
    }

    #[tokio::test]
    async fn test_framing_headers_dropped() {
        let storage = StorageResponse::new(404, "<Error/>")
            .with_header("Transfer-Encoding", "chunked")
            .with_header("Connection", "close")
            .with_header("Content-Length", "999");

        let response = to_http_response(storage);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get(header::TRANSFER_ENCODING).is_none());
        assert!(response.headers().get(header::CONNECTION).is_none());
        assert_ne!(
            response.headers().get(header::CONTENT_LENGTH).map(|v| v.as_bytes()),
            Some(&b"999"[..])
        );
    }

    #[test]
    fn test_invalid_header_skipped() {
        let storage = StorageResponse::new(200, "").with_header("bad header", "x");
        let response = to_http_response(storage);
        assert_eq!(response.status(), StatusCode::OK);
    }
}
