mod app;

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    sync::{Arc, Mutex},
};

use badgetrack_core::{
    api::{BadgeApi, RobloxClient},
    config::{self, AppConfig},
    store::TrackedGameStore,
    tracker::Tracker,
};
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = config::ensure_default_config()?;
    let config = AppConfig::load()?;
    init_logging(&config)?;
    info!(
        config = %config_path.display(),
        data_dir = %config.data_dir.display(),
        "Starting badgetrack"
    );

    let store = TrackedGameStore::open(&config.data_dir, config.storage_key.clone());
    let api: Arc<dyn BadgeApi> =
        Arc::new(RobloxClient::new(&config).context("failed to build HTTP client")?);

    let mut app = app::BadgeTrackApp::new(Tracker::new(store), api);
    app.run().await
}

fn init_logging(config: &AppConfig) -> Result<()> {
    let log_dir = config.log_dir();
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create {}", log_dir.display()))?;
    let log_path = log_dir.join("badgetrack.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open {}", log_path.display()))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
