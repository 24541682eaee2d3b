//! Subscriber-facing side of the price digest service.
//!
//! This crate provides:
//! - The in-memory subscription registry
//! - The `Notifier` delivery trait
//! - Inbound command handling with chat access policy
//! - Telegram bot integration

pub mod inbound;
pub mod notifier;
pub mod registry;
pub mod telegram;

pub use inbound::{AccessPolicy, ChatKind, CommandHandler, Inbound, InboundEvent};
pub use notifier::{DeliveryError, Notifier, RecordingNotifier};
pub use registry::{RecipientId, Registry, RegistryError, SubscriberSnapshot};
pub use telegram::{Command, TelegramBot, TelegramError};
