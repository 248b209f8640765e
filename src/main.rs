//! FlatDAV - WebDAV Gateway for Flat Object Storage
//!
//! Serves GET, PUT, DELETE and MOVE for objects in a single bucket.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flatdav::config::FlatDavConfig;
use flatdav::dav::{BasicAuth, DavServer, DavState};
use flatdav::error::Result;
use flatdav::storage::S3Store;

/// FlatDAV - WebDAV Gateway for Flat Object Storage
#[derive(Parser)]
#[command(name = "flatdav")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (environment variables override it)
    #[arg(short, long, default_value = "flatdav.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway
    Serve,

    /// Validate the effective configuration
    Validate,

    /// Write a configuration template
    Init {
        /// Output path for configuration file
        #[arg(short, long, default_value = "flatdav.toml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve => run_serve(&cli.config, cli.log_level).await,
        Commands::Validate => run_validate(&cli.config),
        Commands::Init { output } => run_init(output),
    }
}

/// Initialize logging
fn init_logging(level: &str, format: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| level.into());

    let registry = tracing_subscriber::registry().with(env_filter);
    if format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Load the config file if present, otherwise the environment alone
fn load_config(path: &Path) -> Result<FlatDavConfig> {
    if path.exists() {
        FlatDavConfig::from_file(path)
    } else {
        FlatDavConfig::from_env()
    }
}

/// Start the gateway
async fn run_serve(config_path: &Path, log_level: Option<String>) -> Result<()> {
    let config = load_config(config_path)?;

    let level = log_level.unwrap_or_else(|| config.logging.level.clone());
    init_logging(&level, &config.logging.format);

    tracing::info!("Starting FlatDAV v{}", env!("CARGO_PKG_VERSION"));

    let store = S3Store::from_config(&config.storage)?;
    let auth = BasicAuth::new(&config.auth, config.server.realm.clone());
    let state = DavState::new(Arc::new(store), auth, config.server.max_body_bytes);
    let server = DavServer::new(config.server.clone(), state);

    tokio::select! {
        result = server.start() => {
            if let Err(e) = result {
                tracing::error!("HTTP server error: {}", e);
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal");
        }
    }

    Ok(())
}

/// Validate configuration
fn run_validate(config_path: &Path) -> Result<()> {
    match load_config(config_path) {
        Ok(config) => {
            println!("✓ Configuration is valid");
            println!("  Bind Address:  {}", config.server.bind_address);
            println!(
                "  Base Path:     {}",
                if config.server.base_path.is_empty() { "/" } else { config.server.base_path.as_str() }
            );
            println!("  Bucket:        {}", config.storage.bucket);
            println!("  Region:        {}", config.storage.region);
            println!(
                "  Endpoint:      {}",
                config.storage.endpoint_url().unwrap_or_else(|| "AWS (virtual-hosted)".to_string())
            );
            println!(
                "  Backend Creds: {}",
                if config.storage.access_key.is_some() { "static" } else { "default chain" }
            );
            println!("  Auth User:     {}", config.auth.username);
            println!("  Max Body:      {} bytes", config.server.max_body_bytes);
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Configuration error: {}", e);
            Err(e)
        }
    }
}

/// Initialize configuration file
fn run_init(output: PathBuf) -> Result<()> {
    let config_content = r#"# FlatDAV Configuration
# Environment variables override every value in this file.

[server]
bind_address = "0.0.0.0:8080"       # FLATDAV_BIND
# base_path = "/api"
max_body_bytes = 536870912          # FLATDAV_MAX_BODY_BYTES
realm = "flatdav"
cors_enabled = false

[storage]
bucket = "my-bucket"                # S3_BUCKET
region = "us-west-2"                # AWS_REGION
# endpoint = "localhost:9000"       # AWS_S3_ENDPOINT (path-style, plain http without a scheme)
# access_key = ""                   # AWS_ACCESS_KEY_ID
# secret_key = ""                   # AWS_SECRET_ACCESS_KEY

[auth]
username = "webdav"                 # HTTP_BASIC_AUTH_USER
password = "changeme"               # HTTP_BASIC_AUTH_PASS

[logging]
level = "info"                      # FLATDAV_LOG_LEVEL
format = "pretty"                   # FLATDAV_LOG_FORMAT (pretty, json)
"#;

    std::fs::write(&output, config_content)?;
    println!("Configuration file created: {}", output.display());
    println!("\nEdit the file to configure your bucket and credentials.");
    println!("Then start with: flatdav --config {} serve", output.display());

    Ok(())
}
