//! FlatDAV Configuration
//!
//! Configuration for the gateway: where it listens, which bucket it fronts,
//! and the single Basic credential clients must present. Values come from an
//! optional TOML file and are overridden by environment variables.

use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Main FlatDAV configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlatDavConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Object storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Client authentication
    #[serde(default)]
    pub auth: AuthConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP bind address
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Path prefix the collection is mounted under (e.g. "/api")
    #[serde(default)]
    pub base_path: String,

    /// Largest request body accepted for PUT
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Realm advertised in WWW-Authenticate
    #[serde(default = "default_realm")]
    pub realm: String,

    /// Enable CORS
    #[serde(default)]
    pub cors_enabled: bool,
}

/// Object storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Bucket holding every object
    #[serde(default)]
    pub bucket: String,

    /// Storage region
    #[serde(default = "default_region")]
    pub region: String,

    /// Custom endpoint for self-hosted backends. Enables path-style addressing.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Static access key (falls back to the default credential chain)
    #[serde(default)]
    pub access_key: Option<String>,

    /// Static secret key
    #[serde(default)]
    pub secret_key: Option<String>,

    /// Session token for temporary credentials
    #[serde(default)]
    pub session_token: Option<String>,
}

/// Client authentication
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Basic auth user name
    #[serde(default)]
    pub username: String,

    /// Basic auth password
    #[serde(default)]
    pub password: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (pretty, json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_max_body_bytes() -> usize {
    512 * 1024 * 1024
}

fn default_realm() -> String {
    "flatdav".to_string()
}

fn default_region() -> String {
    "us-west-2".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            base_path: String::new(),
            max_body_bytes: default_max_body_bytes(),
            realm: default_realm(),
            cors_enabled: false,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            region: default_region(),
            endpoint: None,
            access_key: None,
            secret_key: None,
            session_token: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl AuthConfig {
    /// The exact `Authorization` value clients must send
    pub fn header_value(&self) -> String {
        let raw = format!("{}:{}", self.username, self.password);
        format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode(raw.as_bytes())
        )
    }
}

impl StorageConfig {
    /// Endpoint URL with a scheme. Bare host:port endpoints are reached without TLS.
    pub fn endpoint_url(&self) -> Option<String> {
        self.endpoint.as_deref().map(|endpoint| {
            if endpoint.contains("://") {
                endpoint.trim_end_matches('/').to_string()
            } else {
                format!("http://{}", endpoint.trim_end_matches('/'))
            }
        })
    }

    /// Whether requests use path-style addressing
    pub fn path_style(&self) -> bool {
        self.endpoint.is_some()
    }
}

impl FlatDavConfig {
    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: FlatDavConfig = toml::from_str(&content)?;
        config.apply_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: FlatDavConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the process environment only
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = FlatDavConfig::default();
        config.apply_env(lookup);
        config.validate()?;
        Ok(config)
    }

    /// Overlay environment variables onto this configuration
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(bucket) = get("S3_BUCKET") {
            self.storage.bucket = bucket;
        }
        if let Some(endpoint) = get("AWS_S3_ENDPOINT") {
            self.storage.endpoint = Some(endpoint);
        }
        if let Some(region) = get("AWS_REGION") {
            self.storage.region = region;
        }
        if let Some(key) = get("AWS_ACCESS_KEY_ID") {
            self.storage.access_key = Some(key);
        }
        if let Some(secret) = get("AWS_SECRET_ACCESS_KEY") {
            self.storage.secret_key = Some(secret);
        }
        if let Some(token) = get("AWS_SESSION_TOKEN") {
            self.storage.session_token = Some(token);
        }
        if let Some(user) = get("HTTP_BASIC_AUTH_USER") {
            self.auth.username = user;
        }
        if let Some(pass) = get("HTTP_BASIC_AUTH_PASS") {
            self.auth.password = pass;
        }
        if let Some(bind) = get("FLATDAV_BIND") {
            self.server.bind_address = bind;
        }
        if let Some(limit) = get("FLATDAV_MAX_BODY_BYTES").and_then(|v| v.parse().ok()) {
            self.server.max_body_bytes = limit;
        }
        if let Some(level) = get("FLATDAV_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = get("FLATDAV_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.storage.bucket.is_empty() {
            return Err(Error::Config("storage.bucket (S3_BUCKET) cannot be empty".into()));
        }

        if self.auth.username.is_empty() {
            return Err(Error::Config(
                "auth.username (HTTP_BASIC_AUTH_USER) cannot be empty".into(),
            ));
        }

        if self.auth.username.contains(':') {
            return Err(Error::Config("auth.username cannot contain ':'".into()));
        }

        if self.auth.password.is_empty() {
            return Err(Error::Config(
                "auth.password (HTTP_BASIC_AUTH_PASS) cannot be empty".into(),
            ));
        }

        if self.storage.access_key.is_some() != self.storage.secret_key.is_some() {
            return Err(Error::Config(
                "storage.access_key and storage.secret_key must be set together".into(),
            ));
        }

        if self.server.bind_address.is_empty() {
            return Err(Error::Config("server.bind_address cannot be empty".into()));
        }

        let base = &self.server.base_path;
        if !base.is_empty() && (!base.starts_with('/') || base.ends_with('/')) {
            return Err(Error::Config(format!(
                "server.base_path must start with '/' and not end with '/': {}",
                base
            )));
        }

        Ok(())
    }
}
