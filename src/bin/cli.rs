//! TinyCask CLI
//!
//! Command-line interface for inspecting and editing a store directory.

use clap::{Parser, Subcommand};
use tinycask::{Config, DataType, Store, SyncStrategy};
use tracing_subscriber::{fmt, EnvFilter};

/// TinyCask CLI
#[derive(Parser, Debug)]
#[command(name = "tinycask-cli")]
#[command(about = "CLI for TinyCask key-value store")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./tinycask_data")]
    data_dir: String,

    /// Type tag for written records (0=string 1=list 2=hash 3=set 4=zset)
    #[arg(short = 't', long, default_value = "0")]
    data_type: u16,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// Compact the log
    Merge,

    /// List indexed keys
    Keys,

    /// Print store statistics
    Stats,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tinycask=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .data_type(DataType(args.data_type))
        .sync_strategy(SyncStrategy::EveryWrite)
        .build();

    let store = match Store::open(config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to open store: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&store, args.command) {
        tracing::error!("Command failed: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = store.close() {
        tracing::error!("Failed to close store: {}", e);
        std::process::exit(1);
    }
}

fn run(store: &Store, command: Commands) -> tinycask::Result<()> {
    match command {
        Commands::Get { key } => {
            let value = store.get(key.as_bytes())?;
            println!("{}", String::from_utf8_lossy(&value));
        }
        Commands::Set { key, value } => {
            store.put(key.as_bytes(), value.as_bytes())?;
            println!("OK");
        }
        Commands::Del { key } => {
            store.delete(key.as_bytes())?;
            println!("OK");
        }
        Commands::Merge => {
            let result = store.merge()?;
            println!(
                "scanned={} kept={} bytes_before={} bytes_after={}",
                result.records_scanned, result.records_kept, result.bytes_before, result.bytes_after
            );
        }
        Commands::Keys => {
            let mut keys = store.keys();
            keys.sort();
            for key in keys {
                println!("{}", String::from_utf8_lossy(&key));
            }
        }
        Commands::Stats => {
            println!("tinycask v{}", tinycask::VERSION);
            println!("log:      {}", store.log_path().display());
            println!("log_size: {}", store.log_size());
            println!("keys:     {}", store.len());
        }
    }
    Ok(())
}
