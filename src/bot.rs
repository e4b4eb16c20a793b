//! Chat command handling
//!
//! Recognised messages (exact text after trimming):
//! - `hi` - greeting
//! - `p`  - current price report

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::watch;

use crate::notify::{Message, Notifier, TelegramClient, Update};
use crate::report::PriceReporter;

pub const GREETING_REPLY: &str = "Hey there";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Greet,
    Prices,
}

impl Command {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim() {
            "hi" => Some(Command::Greet),
            "p" => Some(Command::Prices),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Greet => "hi",
            Command::Prices => "p",
        }
    }
}

/// Answers chat commands through a `Notifier`
#[derive(Clone)]
pub struct BotHandler {
    reporter: PriceReporter,
    notifier: Arc<dyn Notifier>,
}

impl BotHandler {
    pub fn new(reporter: PriceReporter, notifier: Arc<dyn Notifier>) -> Self {
        Self { reporter, notifier }
    }

    /// Reply to one message. Returns the command handled, if any.
    pub async fn handle_message(&self, message: &Message) -> Result<Option<Command>> {
        let Some(command) = message.text.as_deref().and_then(Command::parse) else {
            return Ok(None);
        };
        let chat_id = message.chat.id;
        tracing::info!(command = command.as_str(), chat_id = chat_id, "Command received");

        let reply = match command {
            Command::Greet => GREETING_REPLY.to_string(),
            Command::Prices => match self.reporter.report("command").await {
                Ok(report) => report,
                Err(e) => PriceReporter::failure_message(&e),
            },
        };
        self.notifier.send(chat_id, &reply).await?;
        Ok(Some(command))
    }

    pub async fn handle_update(&self, update: &Update) -> Result<Option<Command>> {
        match &update.message {
            Some(message) => self.handle_message(message).await,
            None => Ok(None),
        }
    }

    /// Poll Telegram for updates until `shutdown` flips
    pub async fn run(
        self,
        client: Arc<TelegramClient>,
        retry_delay: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        tracing::info!("Command poller started");
        let mut offset = 0i64;

        loop {
            let updates = tokio::select! {
                result = client.get_updates(offset) => result,
                _ = shutdown.changed() => {
                    tracing::info!("Command poller stopping");
                    return;
                }
            };

            match updates {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        if let Err(e) = self.handle_update(&update).await {
                            tracing::warn!(
                                update_id = update.update_id,
                                error = %e,
                                "Failed to answer command"
                            );
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "getUpdates failed, retrying");
                    tokio::select! {
                        _ = tokio::time::sleep(retry_delay) => {}
                        _ = shutdown.changed() => return,
                    }
                }
            }
        }
    }
}
