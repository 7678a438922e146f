//! Cairn CLI - Fetch, cache, and resolve verified release artifacts

mod commands;

use anyhow::Result;
use cairn_asset::StoreConfig;
use clap::{Parser, Subcommand};
use commands::{add, find};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

#[derive(Parser)]
#[command(name = "cairn")]
#[command(about = "Content-addressed cache for release artifacts", long_about = None)]
#[command(version)]
struct Cli {
    /// Default log level (RUST_LOG takes precedence)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Cache directory (overrides config files and CAIRN_CACHE_ROOT)
    #[arg(long, global = true)]
    cache_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download assets into the cache and list what was registered
    Add {
        /// Asset identifiers (http:// or https:// URLs)
        #[arg(required = true)]
        ids: Vec<String>,

        /// Expected hash (md5/sha1/sha256 hex, optionally "algo:" prefixed);
        /// skips the HEAD request. Only valid with a single URL
        #[arg(long)]
        hash: Option<String>,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Resolve a key to its cached bytes
    Find {
        /// Asset key, e.g. a file name inside an archive
        key: String,

        /// Path suffix used to disambiguate assets sharing a key
        #[arg(long, default_value = "")]
        path: String,

        /// Asset identifiers to ingest before resolving
        #[arg(long, required = true, num_args = 1..)]
        from: Vec<String>,

        /// Write the content here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let mut config = StoreConfig::load()?;
    if let Some(root) = cli.cache_root {
        config.cache_root = root;
    }
    tracing::debug!("Using cache root {}", config.cache_root.display());

    match cli.command {
        Commands::Add { ids, hash, format } => add::run(&config, &ids, hash.as_deref(), &format),
        Commands::Find {
            key,
            path,
            from,
            output,
        } => find::run(
            &config,
            find::FindArgs {
                key,
                path,
                from,
                output,
            },
        ),
    }
}

fn init_tracing(level: &str) {
    let log_level: tracing::Level = level.parse().unwrap_or(tracing::Level::INFO);
    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_filter(env_filter);

    tracing_subscriber::registry().with(stderr_layer).init();
}
