use clap::Parser;
use std::path::PathBuf;

use mapstore_api::{run_server, telemetry};
use mapstore_core::MapstoreConfig;

/// DBRP mapping and API token service.
#[derive(Debug, Parser)]
#[command(name = "mapstore", version, about)]
struct Args {
    /// Config file; replaces the default search path, without env overrides
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `server.bind_address`
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let loaded = match &args.config {
        Some(path) => MapstoreConfig::from_file(path),
        None => MapstoreConfig::load(),
    };
    let mut config = match loaded {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }

    if let Err(e) = telemetry::init_telemetry(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        std::process::exit(1);
    }

    if let Err(err) = run_server(config).await {
        tracing::error!(error = %err, "Server terminated with error");
        std::process::exit(1);
    }
}
