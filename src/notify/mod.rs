//! Notification channel
//!
//! `Notifier` delivers plain-text messages to a chat. `TelegramClient`
//! implements it over the Telegram Bot API and also exposes update polling
//! for the command handler.

mod telegram;

pub use telegram::{Chat, Message, TelegramClient, Update, User};

use anyhow::Result;
use async_trait::async_trait;

/// Plain-text message delivery
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, chat_id: i64, text: &str) -> Result<()>;
}
