//! GasBot Library
//!
//! Cross-chain relayer gas price reports for Telegram

pub mod app;
pub mod bot;
pub mod config;
pub mod error;
pub mod logging;
pub mod notify;
pub mod oracle;
pub mod report;
pub mod schedule;
pub mod types;

pub use error::GasBotError;
