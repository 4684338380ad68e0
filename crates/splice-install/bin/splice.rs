//! splice binary entry point.
//!
//! Thin wrapper around the splice-install library that:
//! 1. Parses command-line arguments
//! 2. Initializes logging
//! 3. Loads the manifest
//! 4. Runs the install and reports the summary

use anyhow::Result;
use splice_install::{InstallConfig, Installer, LogFormat, ManifestStore, default_fetcher};
use splice_protocol::{HttpClient, ManifestClient};
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = InstallConfig::from_args();
    init_tracing(config.log_format);

    tracing::info!(
        "splice {} installing into {}",
        env!("CARGO_PKG_VERSION"),
        config.install_dir.display()
    );

    config.validate()?;

    let http = HttpClient::with_config(&config.http_config())?;
    let store = ManifestStore::new(ManifestClient::new(http.clone(), config.retry_policy()));
    let manifest = store.load(&config).await?;

    let fetcher = default_fetcher(&config, http)?;
    let installer = Installer::new(config, fetcher);

    let token = installer.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping after the current part");
            token.cancel();
        }
    });

    let summary = installer.run(&manifest).await?;
    summary.log();

    if !summary.is_success() {
        anyhow::bail!(
            "{} files failed to install, {} files failed verification",
            summary.failed.len(),
            summary.mismatches.len()
        );
    }

    Ok(())
}
