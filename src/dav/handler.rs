//! Request handling
//!
//! One linear pass per request: authenticate, parse, execute, translate.
//! Every failure ends the request with exactly one response.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use tracing::{debug, error, warn};

use super::auth::BasicAuth;
use super::executor::execute;
use super::operation::{parse_operation, ParseFailure, Verb, DESTINATION};
use super::response::to_http_response;
use crate::storage::ObjectStore;

const UNAUTHORIZED_BODY: &str = "Incorrect HTTP Auth\n";
const MALFORMED_DESTINATION_BODY: &str = "Destination header malformed or missing.\n";
const INVALID_KEY_BODY: &str = "Object key missing or malformed.\n";
const UNREADABLE_BODY: &str = "Failed to read request body.\n";
const BACKEND_FAILURE_BODY: &str = "Internal error with object storage.\n";

/// Shared, read-only state for every request
#[derive(Clone)]
pub struct DavState {
    pub store: Arc<dyn ObjectStore>,
    pub auth: Arc<BasicAuth>,
    pub max_body_bytes: usize,
}

impl DavState {
    pub fn new(store: Arc<dyn ObjectStore>, auth: BasicAuth, max_body_bytes: usize) -> Self {
        Self {
            store,
            auth: Arc::new(auth),
            max_body_bytes,
        }
    }
}

/// An inbound request as the router hands it over
pub struct DavRequest {
    pub method: Method,
    /// Decoded key matched from the route, `None` when the path segment
    /// could not be decoded
    pub path_key: Option<String>,
    /// Original, un-rewritten request URL
    pub request_url: String,
    pub headers: HeaderMap,
    pub body: Body,
}

/// Handle one request
pub async fn handle_request(state: &DavState, request: DavRequest) -> Response {
    let DavRequest {
        method,
        path_key,
        request_url,
        headers,
        body,
    } = request;

    if !state.auth.authorize(&headers) {
        warn!("Rejected {} {}: bad or missing credentials", method, request_url);
        return unauthorized(&state.auth);
    }

    let verb = match Verb::from_method(&method) {
        Some(verb) => verb,
        None => return method_not_allowed(&method),
    };

    let path_key = match path_key {
        Some(key) => key,
        None => return plain(StatusCode::BAD_REQUEST, INVALID_KEY_BODY.to_string()),
    };

    // Only PUT carries a payload; other verbs never touch the body limit.
    let body = if verb == Verb::Put {
        match axum::body::to_bytes(body, state.max_body_bytes).await {
            Ok(b) => b,
            Err(e) => {
                warn!("Failed to read body for {} {}: {}", method, request_url, e);
                return plain(StatusCode::BAD_REQUEST, UNREADABLE_BODY.to_string());
            }
        }
    } else {
        Bytes::new()
    };

    let op = match parse_operation(&method, &path_key, &headers, &request_url, body) {
        Ok(op) => op,
        Err(ParseFailure::UnsupportedMethod) => return method_not_allowed(&method),
        Err(ParseFailure::MalformedDestinationHeader) => {
            return plain(StatusCode::BAD_REQUEST, MALFORMED_DESTINATION_BODY.to_string())
        }
        Err(ParseFailure::InvalidKey) => {
            return plain(StatusCode::BAD_REQUEST, INVALID_KEY_BODY.to_string())
        }
    };
    debug!("{} {} parsed as {:?}", method, request_url, op.verb());

    match execute(state.store.as_ref(), op).await {
        Ok(storage) => to_http_response(storage),
        Err(e) => {
            error!("Error from object storage for {} {}: {}", method, request_url, e);
            plain(StatusCode::INTERNAL_SERVER_ERROR, BACKEND_FAILURE_BODY.to_string())
        }
    }
}

/// Rebuild the URL the client addressed.
///
/// Clients send `Destination` as an absolute URL while the request line is
/// usually origin-form, so the scheme and `Host` are borrowed to put both in
/// the same form before comparison.
pub fn original_url(uri: &Uri, headers: &HeaderMap) -> String {
    let path = uri.path();

    if let (Some(scheme), Some(authority)) = (uri.scheme_str(), uri.authority()) {
        return format!("{}://{}{}", scheme, authority, path);
    }

    let destination_scheme = headers
        .get(DESTINATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|d| d.split_once("://"))
        .map(|(scheme, _)| scheme);
    let host = headers.get(header::HOST).and_then(|v| v.to_str().ok());

    match (destination_scheme, host) {
        (Some(scheme), Some(host)) => format!("{}://{}{}", scheme, host, path),
        _ => path.to_string(),
    }
}

fn plain(status: StatusCode, body: String) -> Response {
    (status, [(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response()
}

fn unauthorized(auth: &BasicAuth) -> Response {
    let mut response = plain(StatusCode::UNAUTHORIZED, UNAUTHORIZED_BODY.to_string());
    if let Ok(challenge) = HeaderValue::from_str(&auth.challenge()) {
        response.headers_mut().insert(header::WWW_AUTHENTICATE, challenge);
    }
    response
}

fn method_not_allowed(method: &Method) -> Response {
    let mut response = plain(
        StatusCode::METHOD_NOT_ALLOWED,
        format!("Method not allowed: {}\n", method),
    );
    if let Ok(allow) = HeaderValue::from_str(&Verb::allow_header()) {
        response.headers_mut().insert(header::ALLOW, allow);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;
    use crate::storage::MemoryStore;
    use http_body_util::BodyExt;

    const GOOD_AUTH: &str = "Basic dXNlcjpwYXNz";

    fn state(store: Arc<MemoryStore>) -> DavState {
        let auth = BasicAuth::new(
            &AuthConfig {
                username: "user".to_string(),
                password: "pass".to_string(),
            },
            "flatdav",
        );
        DavState::new(store, auth, 1024)
    }

    fn request(method: &str, key: &str, auth: Option<&str>, body: impl Into<Body>) -> DavRequest {
        let mut headers = HeaderMap::new();
        if let Some(auth) = auth {
            headers.insert(header::AUTHORIZATION, HeaderValue::from_str(auth).unwrap());
        }
        DavRequest {
            method: Method::from_bytes(method.as_bytes()).unwrap(),
            path_key: Some(key.to_string()),
            request_url: format!("/{}", key),
            headers,
            body: body.into(),
        }
    }

    async fn body_string(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_auth_checked_before_anything() {
        let store = Arc::new(MemoryStore::new());
        let state = state(Arc::clone(&store));

        for method in ["GET", "PUT", "DELETE", "MOVE", "PROPFIND"] {
            let response = handle_request(&state, request(method, "x.txt", None, "hello")).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(
                response.headers()[header::WWW_AUTHENTICATE],
                "Basic realm=\"flatdav\""
            );
            assert_eq!(body_string(response).await, UNAUTHORIZED_BODY);
        }
        assert!(store.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_method() {
        let state = state(Arc::new(MemoryStore::new()));
        let response =
            handle_request(&state, request("PROPFIND", "x.txt", Some(GOOD_AUTH), "")).await;

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "GET, PUT, DELETE, MOVE");
        assert!(body_string(response).await.contains("PROPFIND"));
    }

    #[tokio::test]
    async fn test_move_without_destination() {
        let state = state(Arc::new(MemoryStore::new()));
        let response = handle_request(&state, request("MOVE", "a.txt", Some(GOOD_AUTH), "")).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_string(response).await, MALFORMED_DESTINATION_BODY);
    }

    #[tokio::test]
    async fn test_backend_failure_is_500() {
        let store = Arc::new(MemoryStore::new());
        store.fail_on("get").await;
        let state = state(store);

        let response = handle_request(&state, request("GET", "x.txt", Some(GOOD_AUTH), "")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_string(response).await, BACKEND_FAILURE_BODY);
    }

    #[tokio::test]
    async fn test_body_over_limit() {
        let state = state(Arc::new(MemoryStore::new()));
        let big = "x".repeat(2048);

        let response = handle_request(&state, request("PUT", "x.txt", Some(GOOD_AUTH), big)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_body_limit_only_applies_to_put() {
        let store = Arc::new(MemoryStore::new());
        store.insert("x.txt", "small").await;
        let state = state(Arc::clone(&store));
        let big = "x".repeat(2048);

        let response =
            handle_request(&state, request("PROPFIND", "x.txt", Some(GOOD_AUTH), big.clone())).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(body_string(response).await.contains("PROPFIND"));

        let response =
            handle_request(&state, request("GET", "x.txt", Some(GOOD_AUTH), big.clone())).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = handle_request(&state, request("DELETE", "x.txt", Some(GOOD_AUTH), big)).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_undecodable_path() {
        let store = Arc::new(MemoryStore::new());
        let state = state(Arc::clone(&store));

        let mut unauthenticated = request("GET", "x.txt", None, "");
        unauthenticated.path_key = None;
        let response = handle_request(&state, unauthenticated).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let mut authenticated = request("GET", "x.txt", Some(GOOD_AUTH), "");
        authenticated.path_key = None;
        let response = handle_request(&state, authenticated).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_string(response).await, INVALID_KEY_BODY);

        assert!(store.calls().await.is_empty());
    }

    #[test]
    fn test_original_url_origin_form() {
        let uri: Uri = "/api/a.txt".parse().unwrap();
        assert_eq!(original_url(&uri, &HeaderMap::new()), "/api/a.txt");
    }

    #[test]
    fn test_original_url_absolute_destination() {
        let uri: Uri = "/api/a.txt?x=1".parse().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("dav.example.com"));
        headers.insert(DESTINATION, HeaderValue::from_static("https://dav.example.com/api/b.txt"));

        assert_eq!(original_url(&uri, &headers), "https://dav.example.com/api/a.txt");
    }

    #[test]
    fn test_original_url_absolute_form() {
        let uri: Uri = "http://dav.example.com/api/a.txt".parse().unwrap();
        assert_eq!(
            original_url(&uri, &HeaderMap::new()),
            "http://dav.example.com/api/a.txt"
        );
    }
}
