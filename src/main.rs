//! GasBot - relayer gas price reports on a schedule and on demand

use anyhow::Result;
use gasbot::app::App;
use gasbot::config::AppConfig;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    gasbot::logging::init(config.logging.json);

    tracing::info!("🤖 GasBot starting (v{})", env!("CARGO_PKG_VERSION"));
    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "Invalid configuration");
        return Err(e.into());
    }
    tracing::info!(config = %config, "Configuration loaded");

    let app = App::start(&config).await?;

    wait_for_shutdown().await;
    tracing::info!("Shutdown signal received, stopping");
    app.stop().await;
    tracing::info!("GasBot stopped");

    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown() {
    use tokio::signal::unix::{signal as unix_signal, SignalKind};

    match unix_signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "SIGTERM handler unavailable, waiting for Ctrl-C only");
            let _ = signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown() {
    let _ = signal::ctrl_c().await;
}
