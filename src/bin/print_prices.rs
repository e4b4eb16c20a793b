//! One-shot price report to stdout
//!
//! Usage: cargo run --bin print_prices
//!
//! Uses the same endpoint configuration as the bot; Telegram settings are
//! not required.

use gasbot::app::build_registry;
use gasbot::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    gasbot::logging::init(config.logging.json);
    config.validate_endpoints()?;

    let mut registry = build_registry(&config)?;
    let report = registry.print_prices().await?;
    println!("{}", report);

    Ok(())
}
