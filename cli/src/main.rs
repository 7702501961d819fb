//! NPR parking fee service - CLI server
//!
//! ```sh
//! # Run with default config (~/.config/npr-parking/config.toml)
//! npr-parking
//!
//! # Custom config path and dataset
//! npr-parking --config /etc/npr-parking/config.toml --dataset /srv/npr/tarieven.csv
//!
//! # Validate config and dataset without starting
//! npr-parking --check
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use npr_parking::config::AppConfig;
use npr_parking::server::{init_tracing, load_services, ServerHandle, ServerOptions};

/// Parking fees for Dutch addresses from the NPR tariff dataset.
#[derive(Parser, Debug)]
#[command(
    name = "npr-parking",
    version,
    about = "Parking fee calculator for Dutch addresses",
    long_about = "REST API computing parking fees from the NPR open tariff dataset, \
                  with zone resolution via the BAG address registry.\n\n\
                  Default config: ~/.config/npr-parking/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "NPR_CONFIG")]
    config: Option<PathBuf>,

    /// Override the REST API listen port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the tariff dataset CSV path.
    #[arg(short, long)]
    dataset: Option<PathBuf>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration and dataset, print a summary and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli
        .config
        .unwrap_or_else(npr_parking::default_config_path);

    let (mut config, load_error) = AppConfig::load_or_default(&config_path);

    // ── Apply CLI overrides ────────────────────────────────────
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(dataset) = cli.dataset {
        config.dataset.csv_file = dataset;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    init_tracing(&config);
    match load_error {
        None => info!("Configuration loaded from {}", config_path.display()),
        Some(e) => {
            error!("Failed to load config from {}: {}", config_path.display(), e);
            error!("Using default configuration.");
        }
    }

    // ── Validation mode ────────────────────────────────────────
    if cli.check {
        config.validate()?;
        let loaded = load_services(&config)?;
        let catalog = loaded.service.resolver().catalog();
        println!("Configuration is valid");
        println!("   Config file   : {}", config_path.display());
        println!("   API address   : {}", config.server.address());
        println!("   Dataset       : {}", config.dataset.csv_file.display());
        println!("   Tariff rows   : {}", loaded.dataset_rows);
        println!("   Zones         : {}", catalog.len());
        if let Some(top) = catalog.most_popular() {
            println!("   Most popular  : {} ({} rows)", top.id(), top.record_count);
        }
        println!(
            "   BAG lookup    : {}",
            if config.bag.enabled { config.bag.base_url.as_str() } else { "disabled" }
        );
        println!("   Log level     : {}", config.logging.level);
        return Ok(());
    }

    // ── Start server ───────────────────────────────────────────
    let handle = ServerHandle::start(ServerOptions { config }).await?;

    // Install OS signal handlers (SIGTERM, SIGINT)
    handle.install_signal_handler();
    info!("Press Ctrl+C to shut down gracefully.");

    handle.wait().await;

    Ok(())
}
