//! Inbound events from the chat transport.
//!
//! The transport adapter turns its updates into [`Inbound`] values; this
//! module decides whether they are allowed and forwards them to the
//! registry. Replies are plain text for the adapter to send back.

use crate::registry::{RecipientId, Registry, RegistryError};
use pricebell_core::PairId;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Where an event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    Private,
    Group,
    Channel,
}

/// What the sender asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// First contact
    Contact,
    /// Flip one pair
    Toggle(String),
    /// Confirm the current selection
    Confirm,
    /// Drop every subscription
    Unsubscribe,
    /// List tracked pairs
    ListPairs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    pub recipient: RecipientId,
    pub chat: ChatKind,
    pub event: InboundEvent,
}

impl Inbound {
    pub fn new(recipient: RecipientId, chat: ChatKind, event: InboundEvent) -> Self {
        Self {
            recipient,
            chat,
            event,
        }
    }

    pub fn private(recipient: RecipientId, event: InboundEvent) -> Self {
        Self::new(recipient, ChatKind::Private, event)
    }
}

/// Which chat kinds may talk to the bot.
#[derive(Debug, Clone, Copy)]
pub struct AccessPolicy {
    pub allow_groups: bool,
    pub allow_channels: bool,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self {
            allow_groups: true,
            allow_channels: false,
        }
    }
}

impl AccessPolicy {
    pub fn allows(&self, chat: ChatKind) -> bool {
        match chat {
            ChatKind::Private => true,
            ChatKind::Group => self.allow_groups,
            ChatKind::Channel => self.allow_channels,
        }
    }
}

/// Applies inbound events to the registry.
pub struct CommandHandler {
    registry: Arc<Registry>,
    policy: AccessPolicy,
    interval: Duration,
}

impl CommandHandler {
    /// `interval` is the broadcast cadence quoted back to users.
    pub fn new(registry: Arc<Registry>, policy: AccessPolicy, interval: Duration) -> Self {
        Self {
            registry,
            policy,
            interval,
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Apply an event. Returns the reply, or `None` if the chat is not allowed.
    pub fn handle(&self, inbound: &Inbound) -> Option<String> {
        if !self.policy.allows(inbound.chat) {
            debug!(
                recipient = inbound.recipient,
                chat = ?inbound.chat,
                "Ignoring event from disallowed chat"
            );
            return None;
        }

        let recipient = inbound.recipient;
        let reply = match &inbound.event {
            InboundEvent::Contact => {
                if self.registry.ensure(recipient) {
                    info!(recipient = recipient, "New subscriber");
                }
                format!(
                    "Welcome to PriceBell!\n\n\
                     Pick the pairs you want with /toggle <PAIR>, then /confirm.\n\
                     Available pairs: {}",
                    self.available_pairs()
                )
            }

            InboundEvent::Toggle(pair) => {
                let pair = pair.trim().to_uppercase();
                if pair.is_empty() {
                    format!(
                        "Usage: /toggle <PAIR>\nAvailable pairs: {}",
                        self.available_pairs()
                    )
                } else {
                    match self.registry.toggle(recipient, &pair) {
                        Ok(true) => format!("Subscribed to {}", pair),
                        Ok(false) => format!("Unsubscribed from {}", pair),
                        Err(e) => self.describe_error(&e),
                    }
                }
            }

            InboundEvent::Confirm => match self.registry.subscriptions(recipient) {
                None => self.describe_error(&RegistryError::UnknownRecipient(recipient)),
                Some(pairs) if pairs.is_empty() => {
                    "You have not selected any pair yet. Use /toggle <PAIR>.".to_string()
                }
                Some(pairs) => format!(
                    "You will receive {} every {}.",
                    join_ids(&pairs),
                    describe_interval(self.interval)
                ),
            },

            InboundEvent::Unsubscribe => {
                self.registry.clear(recipient);
                "You have been unsubscribed from all pairs.".to_string()
            }

            InboundEvent::ListPairs => format!("Available pairs: {}", self.available_pairs()),
        };

        Some(reply)
    }

    fn available_pairs(&self) -> String {
        self.registry
            .pairs()
            .ids()
            .map(|id| id.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn describe_error(&self, error: &RegistryError) -> String {
        match error {
            RegistryError::UnknownRecipient(_) => "Please send /start first.".to_string(),
            RegistryError::UnknownPair(pair) => format!(
                "Unknown pair: {}\nAvailable pairs: {}",
                pair,
                self.available_pairs()
            ),
        }
    }
}

fn join_ids(ids: &[PairId]) -> String {
    ids.iter().map(|id| id.as_str()).collect::<Vec<_>>().join(", ")
}

/// Human-readable cadence, e.g. "30 minutes".
pub fn describe_interval(interval: Duration) -> String {
    let secs = interval.as_secs();
    match secs {
        s if s > 0 && s % 3600 == 0 => plural(s / 3600, "hour"),
        s if s > 0 && s % 60 == 0 => plural(s / 60, "minute"),
        s => plural(s, "second"),
    }
}

fn plural(n: u64, unit: &str) -> String {
    if n == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", n, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use pricebell_core::PairTable;

    fn handler(policy: AccessPolicy) -> CommandHandler {
        let registry = Arc::new(Registry::new(Arc::new(PairTable::default())));
        CommandHandler::new(registry, policy, Duration::from_secs(1800))
    }

    #[test]
    fn test_contact_registers() {
        let handler = handler(AccessPolicy::default());
        let reply = handler.handle(&Inbound::private(5, InboundEvent::Contact)).unwrap();
        assert!(reply.contains("USDTIRT, BTCIRT"));
        assert_eq!(handler.registry().subscriptions(5), Some(Vec::new()));
    }

    #[test]
    fn test_toggle_before_contact() {
        let handler = handler(AccessPolicy::default());
        let reply = handler
            .handle(&Inbound::private(5, InboundEvent::Toggle("USDTIRT".into())))
            .unwrap();
        assert_eq!(reply, "Please send /start first.");
        assert!(handler.registry().is_empty());
    }

    #[test]
    fn test_toggle_normalizes_case() {
        let handler = handler(AccessPolicy::default());
        handler.handle(&Inbound::private(5, InboundEvent::Contact));

        let on = handler
            .handle(&Inbound::private(5, InboundEvent::Toggle(" usdtirt ".into())))
            .unwrap();
        assert_eq!(on, "Subscribed to USDTIRT");

        let off = handler
            .handle(&Inbound::private(5, InboundEvent::Toggle("USDTIRT".into())))
            .unwrap();
        assert_eq!(off, "Unsubscribed from USDTIRT");
    }

    #[test]
    fn test_toggle_unknown_pair_reply() {
        let handler = handler(AccessPolicy::default());
        handler.handle(&Inbound::private(5, InboundEvent::Contact));
        let reply = handler
            .handle(&Inbound::private(5, InboundEvent::Toggle("DOGE".into())))
            .unwrap();
        assert_eq!(reply, "Unknown pair: DOGE\nAvailable pairs: USDTIRT, BTCIRT");
    }

    #[test]
    fn test_toggle_blank_pair_shows_usage() {
        let handler = handler(AccessPolicy::default());
        handler.handle(&Inbound::private(5, InboundEvent::Contact));
        for arg in ["", "   "] {
            let reply = handler
                .handle(&Inbound::private(5, InboundEvent::Toggle(arg.into())))
                .unwrap();
            assert_eq!(reply, "Usage: /toggle <PAIR>\nAvailable pairs: USDTIRT, BTCIRT");
        }
        assert_eq!(handler.registry().subscriptions(5), Some(vec![]));
    }

    #[test]
    fn test_confirm() {
        let handler = handler(AccessPolicy::default());
        handler.handle(&Inbound::private(5, InboundEvent::Contact));

        let empty = handler.handle(&Inbound::private(5, InboundEvent::Confirm)).unwrap();
        assert!(empty.contains("not selected"));

        handler.handle(&Inbound::private(5, InboundEvent::Toggle("BTCIRT".into())));
        let reply = handler.handle(&Inbound::private(5, InboundEvent::Confirm)).unwrap();
        assert_eq!(reply, "You will receive BTCIRT every 30 minutes.");
    }

    #[test]
    fn test_unsubscribe_clears() {
        let handler = handler(AccessPolicy::default());
        handler.handle(&Inbound::private(5, InboundEvent::Contact));
        handler.handle(&Inbound::private(5, InboundEvent::Toggle("BTCIRT".into())));
        handler.handle(&Inbound::private(5, InboundEvent::Unsubscribe));
        assert_eq!(handler.registry().subscriptions(5), Some(Vec::new()));
    }

    #[test]
    fn test_policy_denies_channels_and_groups() {
        let handler = handler(AccessPolicy {
            allow_groups: false,
            allow_channels: false,
        });
        assert!(handler
            .handle(&Inbound::new(-100, ChatKind::Channel, InboundEvent::Contact))
            .is_none());
        assert!(handler
            .handle(&Inbound::new(-200, ChatKind::Group, InboundEvent::Contact))
            .is_none());
        assert!(handler.registry().is_empty());
    }

    #[test]
    fn test_default_policy_allows_groups() {
        let policy = AccessPolicy::default();
        assert!(policy.allows(ChatKind::Private));
        assert!(policy.allows(ChatKind::Group));
        assert!(!policy.allows(ChatKind::Channel));
    }

    #[test]
    fn test_describe_interval() {
        assert_eq!(describe_interval(Duration::from_secs(1800)), "30 minutes");
        assert_eq!(describe_interval(Duration::from_secs(3600)), "1 hour");
        assert_eq!(describe_interval(Duration::from_secs(45)), "45 seconds");
        assert_eq!(describe_interval(Duration::from_secs(60)), "1 minute");
    }
}
