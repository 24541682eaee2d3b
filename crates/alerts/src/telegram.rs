//! Telegram transport: command intake and message delivery.

use crate::inbound::{ChatKind, CommandHandler, Inbound, InboundEvent};
use crate::notifier::{DeliveryError, Notifier};
use crate::registry::RecipientId;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::Chat;
use teloxide::utils::command::BotCommands;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum TelegramError {
    #[error("Telegram API error: {0}")]
    Api(#[from] teloxide::RequestError),
}

/// Bot commands.
#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Start the bot and register for price digests")]
    Start,
    #[command(description = "Subscribe or unsubscribe a pair. Usage: /toggle USDTIRT")]
    Toggle(String),
    #[command(description = "Confirm your current selection")]
    Confirm,
    #[command(description = "Stop all price digests")]
    Unsubscribe,
    #[command(description = "List tracked pairs")]
    Pairs,
    #[command(description = "Show help")]
    Help,
}

impl Command {
    /// The registry-facing event for this command, if any.
    pub fn to_event(&self) -> Option<InboundEvent> {
        match self {
            Command::Start => Some(InboundEvent::Contact),
            Command::Toggle(pair) => Some(InboundEvent::Toggle(pair.clone())),
            Command::Confirm => Some(InboundEvent::Confirm),
            Command::Unsubscribe => Some(InboundEvent::Unsubscribe),
            Command::Pairs => Some(InboundEvent::ListPairs),
            Command::Help => None,
        }
    }
}

/// Classify a Telegram chat.
pub fn chat_kind(chat: &Chat) -> ChatKind {
    if chat.is_private() {
        ChatKind::Private
    } else if chat.is_channel() {
        ChatKind::Channel
    } else {
        ChatKind::Group
    }
}

/// Telegram bot wrapper.
pub struct TelegramBot {
    bot: Bot,
    handler: CommandHandler,
    send_timeout: Duration,
}

impl TelegramBot {
    /// Create a new bot with the given token.
    pub fn new(token: &str, handler: CommandHandler, send_timeout: Duration) -> Self {
        Self {
            bot: Bot::new(token),
            handler,
            send_timeout,
        }
    }

    /// Run the command loop until the update stream ends.
    pub async fn run(self: Arc<Self>) {
        let bot = self.bot.clone();

        if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
            warn!(error = %e, "Failed to register bot commands");
        }

        let handler = Update::filter_message().filter_command::<Command>().endpoint(
            move |bot: Bot, msg: Message, cmd: Command| {
                let this = Arc::clone(&self);
                async move { this.handle_command(bot, msg, cmd).await }
            },
        );

        info!("Telegram command loop started");
        Dispatcher::builder(bot, handler).build().dispatch().await;
        info!("Telegram command loop stopped");
    }

    async fn handle_command(
        &self,
        bot: Bot,
        msg: Message,
        cmd: Command,
    ) -> Result<(), TelegramError> {
        debug!(chat_id = msg.chat.id.0, command = ?cmd, "Received command");

        let reply = match cmd.to_event() {
            Some(event) => {
                let inbound = Inbound::new(msg.chat.id.0, chat_kind(&msg.chat), event);
                match self.handler.handle(&inbound) {
                    Some(reply) => reply,
                    None => return Ok(()),
                }
            }
            None => Command::descriptions().to_string(),
        };

        bot.send_message(msg.chat.id, reply).await?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramBot {
    async fn send(&self, recipient: RecipientId, text: &str) -> Result<(), DeliveryError> {
        let request = self.bot.send_message(ChatId(recipient), text);
        match tokio::time::timeout(self.send_timeout, request).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(DeliveryError::Rejected(e.to_string())),
            Err(_) => Err(DeliveryError::Timeout(self.send_timeout)),
        }
    }
}
