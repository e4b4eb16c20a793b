//! Wiring from configuration to running components

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::bot::BotHandler;
use crate::config::AppConfig;
use crate::notify::{Notifier, TelegramClient};
use crate::oracle::RelayerOracle;
use crate::report::{EndpointRegistry, PriceReporter, ReportClock};
use crate::schedule::{run_scheduler, Schedule};
use crate::types::Network;

/// Build the registry with one relayer client per configured endpoint
pub fn build_registry(config: &AppConfig) -> Result<EndpointRegistry> {
    let mut registry = EndpointRegistry::new(ReportClock::system())
        .with_glyphs(config.report.glyphs())
        .with_failure_policy(config.report.failure_policy);

    let groups = [
        (Network::Mainnet, &config.endpoints.mainnet),
        (Network::Testnet, &config.endpoints.testnet),
    ];
    for (network, endpoints) in groups {
        for endpoint in endpoints {
            let oracle = RelayerOracle::connect(&endpoint.rpc_url, &endpoint.relayer_address)
                .with_context(|| format!("Failed to set up endpoint {}", endpoint.name))?;
            registry.add(network, endpoint.name.clone(), endpoint.chain_id, Box::new(oracle));
        }
    }

    Ok(registry)
}

/// Running background tasks plus the shutdown switch
pub struct App {
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl App {
    /// Spawn the command poller and, when enabled, the scheduler
    pub async fn start(config: &AppConfig) -> Result<Self> {
        let reporter = PriceReporter::new(build_registry(config)?);
        let telegram = Arc::new(TelegramClient::new(&config.telegram)?);
        let bot_name = telegram
            .get_me()
            .await
            .context("Telegram token check failed")?;
        tracing::info!(bot = %bot_name, "Connected to Telegram");

        let (shutdown, shutdown_rx) = watch::channel(false);
        let notifier: Arc<dyn Notifier> = telegram.clone();
        let mut tasks = Vec::new();

        let handler = BotHandler::new(reporter.clone(), notifier.clone());
        let retry_delay = Duration::from_millis(config.telegram.retry_delay_ms);
        tasks.push(tokio::spawn(handler.run(
            telegram.clone(),
            retry_delay,
            shutdown_rx.clone(),
        )));

        if config.schedule.enabled {
            let schedule = Schedule::parse(&config.schedule.cron)?;
            tasks.push(tokio::spawn(run_scheduler(
                schedule,
                reporter,
                notifier,
                config.telegram.chat_id,
                shutdown_rx,
            )));
        } else {
            tracing::info!("Scheduled reports disabled");
        }

        Ok(Self { shutdown, tasks })
    }

    /// Signal every task to stop and wait for them
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        for task in self.tasks {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Task ended abnormally");
            }
        }
    }
}
