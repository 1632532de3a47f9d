mod api;
mod app;
mod config;
mod download;
mod upload;
mod utils;

use anyhow::{anyhow, Context, Result};
use api::{HealthReport, ShareClient};
use app::DropItApp;
use clap::Parser;
use config::ApiConfig;
use log::LevelFilter;
use std::path::PathBuf;

/// Desktop client for the DropIt file-sharing service.
#[derive(Parser, Debug)]
#[command(name = "dropit", version, about)]
struct Cli {
    /// TOML file with backend settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides the backend base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Directory downloaded files are saved to
    #[arg(long)]
    download_dir: Option<PathBuf>,

    /// Check the backend, print the result and exit
    #[arg(long)]
    check: bool,

    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    utils::logger::setup_logging(cli.log_level);

    let mut config = ApiConfig::load(cli.config.as_deref())?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    if let Some(dir) = cli.download_dir {
        config.download_dir = Some(dir);
    }
    log::info!("Using backend {}", config.base_url);

    let client = ShareClient::new(config).context("invalid backend configuration")?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    if cli.check {
        return run_check(&runtime, &client);
    }

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([640.0, 760.0])
            .with_min_inner_size([420.0, 520.0]),
        ..Default::default()
    };

    eframe::run_native(
        "DropIt",
        options,
        Box::new(move |cc| Box::new(DropItApp::new(cc, client, runtime))),
    )
    .map_err(|e| anyhow!("failed to start the window: {}", e))
}

fn run_check(runtime: &tokio::runtime::Runtime, client: &ShareClient) -> Result<()> {
    let status = client.status();
    println!("Backend:  {}", status.base_url);
    println!("Timeout:  {} ms", status.timeout_ms);
    for (name, path) in &status.endpoints {
        println!("  {:<9} {}", name, path);
    }

    match runtime.block_on(client.health()) {
        HealthReport::Reachable { status } => {
            println!("Status:   reachable ({})", status);
            Ok(())
        }
        HealthReport::Unreachable(reason) => Err(anyhow!("backend unreachable: {}", reason)),
    }
}
