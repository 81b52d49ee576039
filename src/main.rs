//! BucketView - Object Storage Browser
//!
//! Serves a JSON API, minimal HTML pages or a full folder browser with an
//! uploader on top of an S3-compatible object store.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bucketview::api::HttpServer;
use bucketview::config::{BucketViewConfig, Variant, CONFIG_TEMPLATE};
use bucketview::error::Result;
use bucketview::storage::{MemoryStore, ObjectStore, S3Store};

/// BucketView - Object Storage Browser
#[derive(Parser)]
#[command(name = "bucketview")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "bucketview.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); defaults to logging.level
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP front-end
    Serve {
        /// Address to listen on (overrides api.bind_address)
        #[arg(short, long)]
        bind: Option<String>,

        /// Front-end to serve: json, html or browser (overrides api.variant)
        #[arg(long)]
        variant: Option<Variant>,

        /// Serve from an in-memory store instead of S3
        #[arg(long)]
        memory: bool,

        /// Bucket to create in the in-memory store (repeatable)
        #[arg(long = "bucket", requires = "memory")]
        buckets: Vec<String>,
    },

    /// Initialize a new configuration file
    Init {
        /// Output path for configuration file
        #[arg(short, long, default_value = "bucketview.toml")]
        output: PathBuf,
    },

    /// Validate configuration file and environment
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = cli
        .log_level
        .clone()
        .or_else(|| {
            BucketViewConfig::from_file(&cli.config)
                .ok()
                .map(|c| c.logging.level)
        })
        .unwrap_or_else(|| "info".to_string());

    // Initialize logging
    init_logging(&level);

    match cli.command {
        Commands::Serve {
            bind,
            variant,
            memory,
            buckets,
        } => run_serve(cli.config, bind, variant, memory, buckets).await,
        Commands::Init { output } => run_init(output),
        Commands::Validate => run_validate(cli.config),
    }
}

/// Initialize logging
fn init_logging(level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| level.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Start the HTTP front-end
async fn run_serve(
    config_path: PathBuf,
    bind: Option<String>,
    variant: Option<Variant>,
    memory: bool,
    buckets: Vec<String>,
) -> Result<()> {
    let mut config = match BucketViewConfig::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to load configuration from {:?}: {}", config_path, e);
            return Err(e);
        }
    };

    if let Some(bind) = bind {
        config.api.bind_address = bind;
    }
    if let Some(variant) = variant {
        config.api.variant = variant;
    }

    let store: Arc<dyn ObjectStore> = if memory {
        let store = MemoryStore::new();
        for bucket in &buckets {
            store.create_bucket(bucket).await;
        }
        tracing::warn!("Serving from an in-memory store; nothing is persisted");
        Arc::new(store)
    } else {
        tracing::info!(
            "Using object storage at {} (region {})",
            config.storage.endpoint.as_deref().unwrap_or("AWS"),
            config.storage.region
        );
        Arc::new(S3Store::new(&config.storage)?)
    };

    let server = HttpServer::new(config.api.clone(), store, config.links.clone());
    server.start().await
}

/// Initialize configuration file
fn run_init(output: PathBuf) -> Result<()> {
    std::fs::write(&output, CONFIG_TEMPLATE)?;
    println!("Configuration file created: {}", output.display());
    println!("\nEdit the file to point at your object storage.");
    println!("Then start with: bucketview --config {} serve", output.display());

    Ok(())
}

/// Validate configuration
fn run_validate(config_path: PathBuf) -> Result<()> {
    match BucketViewConfig::load(&config_path) {
        Ok(config) => {
            println!("✓ Configuration is valid");
            println!("  Variant:        {}", config.api.variant);
            println!("  Bind Address:   {}", config.api.bind_address);
            println!(
                "  Endpoint:       {}",
                config.storage.endpoint.as_deref().unwrap_or("(AWS)")
            );
            println!("  Region:         {}", config.storage.region);
            println!(
                "  Credentials:    {}",
                if config.storage.access_key.is_some() { "set" } else { "(anonymous)" }
            );
            println!("  Link Expiry:    {} s", config.links.link_expiry_secs);
            println!("  Share Expiry:   {} s", config.links.share_expiry_secs);
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Configuration error: {}", e);
            Err(e)
        }
    }
}
