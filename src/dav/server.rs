//! HTTP Server
//!
//! Every object lives at `<base_path>/<key>`. The single route accepts any
//! method so that extension verbs like MOVE reach the handler.

use axum::{
    body::Body,
    extract::{rejection::PathRejection, OriginalUri, Path, State},
    http::{HeaderMap, Method},
    response::Response,
    routing::any,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handler::{handle_request, original_url, DavRequest, DavState};
use crate::config::ServerConfig;
use crate::error::{Error, Result};

/// Build the router for the DAV collection
pub fn create_router(state: DavState, config: &ServerConfig) -> Router {
    let collection = Router::new()
        .route("/:filename", any(handle_object))
        .with_state(state);

    let router = if config.base_path.is_empty() {
        collection
    } else {
        Router::new().nest(&config.base_path, collection)
    };

    let router = router.layer(TraceLayer::new_for_http());
    if config.cors_enabled {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

async fn handle_object(
    State(state): State<DavState>,
    filename: std::result::Result<Path<String>, PathRejection>,
    OriginalUri(uri): OriginalUri,
    method: Method,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let request_url = original_url(&uri, &headers);
    // An undecodable segment is reported by the handler, after authentication
    let path_key = match filename {
        Ok(Path(filename)) => Some(filename),
        Err(e) => {
            tracing::debug!("Undecodable path {}: {}", request_url, e);
            None
        }
    };
    handle_request(
        &state,
        DavRequest {
            method,
            path_key,
            request_url,
            headers,
            body,
        },
    )
    .await
}

/// WebDAV gateway server
pub struct DavServer {
    config: ServerConfig,
    state: DavState,
}

impl DavServer {
    /// Create a new server
    pub fn new(config: ServerConfig, state: DavState) -> Self {
        Self { config, state }
    }

    /// Get the router, e.g. for in-process testing
    pub fn router(&self) -> Router {
        create_router(self.state.clone(), &self.config)
    }

    /// Start the HTTP server
    pub async fn start(&self) -> Result<()> {
        let app = self.router();

        let listener = tokio::net::TcpListener::bind(&self.config.bind_address).await?;
        tracing::info!(
            "WebDAV gateway listening on {}{}",
            self.config.bind_address,
            if self.config.base_path.is_empty() { "/" } else { self.config.base_path.as_str() }
        );

        axum::serve(listener, app)
            .await
            .map_err(|e| Error::Network(format!("HTTP server error: {}", e)))?;

        Ok(())
    }
}
