#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod config;
mod core;
mod ui;
mod utils;

use crate::app::ElectionMonitorApp;
use crate::config::ConfigManager;
use crate::core::cache::ResultCache;
use crate::core::fetcher::DataFetcher;
use crate::core::source::HttpSource;
use anyhow::Context as _;
use clap::Parser;
use eframe::egui;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Live election turnout by country.
#[derive(Parser, Debug)]
#[command(name = "election-monitor", version, about)]
struct Cli {
    /// Config file to use instead of the one in the user config directory
    #[arg(long, env = "ELECTION_MONITOR_CONFIG")]
    config: Option<PathBuf>,

    /// Delete the result cache before starting
    #[arg(long)]
    clear_cache: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new(),
    };
    let config = config_manager.load();
    crate::config::validate(&config)
        .with_context(|| format!("invalid config {}", config_manager.get_config_file_path().display()))?;
    info!(config = %config.config_file, cache = %config.cache_file, "starting election monitor");

    let mut cache = ResultCache::open(config.cache_path());
    if cli.clear_cache {
        cache.clear().context("failed to clear cache")?;
        info!("cache cleared");
    }
    info!(cached = cache.len(), "result cache ready");

    let source = HttpSource::new(&config).context("failed to build HTTP client")?;
    let fetcher = DataFetcher::new(Arc::new(source), cache, config);
    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([900.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Election Monitor",
        options,
        Box::new(move |cc| {
            Ok(Box::new(ElectionMonitorApp::new(
                cc,
                runtime,
                fetcher,
                config_manager,
            )))
        }),
    )
    .map_err(|e| anyhow::anyhow!("window error: {e}"))
}
