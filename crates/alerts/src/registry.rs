//! In-memory subscription registry.
//!
//! Maps each recipient to the tracked pairs it opted into. Callers never get
//! a reference into the map; reads go through [`Registry::snapshot`] or
//! [`Registry::subscriptions`], which return copies.

use pricebell_core::{PairId, PairTable};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use tracing::debug;

/// Transport-assigned recipient identifier (a Telegram chat id).
pub type RecipientId = i64;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unknown recipient: {0}")]
    UnknownRecipient(RecipientId),
    #[error("Unknown pair: {0}")]
    UnknownPair(String),
}

/// Point-in-time copy of one subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberSnapshot {
    pub recipient: RecipientId,
    /// Subscribed pairs in subscription order
    pub pairs: Vec<PairId>,
}

/// Registry of subscribers and their pair selections.
pub struct Registry {
    pairs: Arc<PairTable>,
    subscribers: RwLock<BTreeMap<RecipientId, Vec<PairId>>>,
}

impl Registry {
    pub fn new(pairs: Arc<PairTable>) -> Self {
        Self {
            pairs,
            subscribers: RwLock::new(BTreeMap::new()),
        }
    }

    /// The tracked pair table subscriptions are checked against.
    pub fn pairs(&self) -> &PairTable {
        &self.pairs
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<RecipientId, Vec<PairId>>> {
        self.subscribers.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<RecipientId, Vec<PairId>>> {
        self.subscribers.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a recipient with no subscriptions. Returns true if it was new.
    pub fn ensure(&self, recipient: RecipientId) -> bool {
        let mut subscribers = self.write();
        if subscribers.contains_key(&recipient) {
            return false;
        }
        subscribers.insert(recipient, Vec::new());
        debug!(recipient = recipient, "Registered subscriber");
        true
    }

    /// Flip membership of `pair_id` for `recipient`.
    ///
    /// Returns the membership after the flip.
    pub fn toggle(&self, recipient: RecipientId, pair_id: &str) -> Result<bool, RegistryError> {
        let mut subscribers = self.write();
        let subscribed = subscribers
            .get_mut(&recipient)
            .ok_or(RegistryError::UnknownRecipient(recipient))?;

        let pair = self
            .pairs
            .get(pair_id)
            .ok_or_else(|| RegistryError::UnknownPair(pair_id.to_string()))?;

        if let Some(pos) = subscribed.iter().position(|p| *p == pair.id) {
            subscribed.remove(pos);
            debug!(recipient = recipient, pair = pair_id, "Unsubscribed from pair");
            Ok(false)
        } else {
            subscribed.push(pair.id.clone());
            debug!(recipient = recipient, pair = pair_id, "Subscribed to pair");
            Ok(true)
        }
    }

    /// Drop every subscription of `recipient`. Unknown recipients are ignored.
    pub fn clear(&self, recipient: RecipientId) {
        if let Some(subscribed) = self.write().get_mut(&recipient) {
            subscribed.clear();
        }
    }

    /// Copy of one recipient's subscriptions, or `None` if unknown.
    pub fn subscriptions(&self, recipient: RecipientId) -> Option<Vec<PairId>> {
        self.read().get(&recipient).cloned()
    }

    /// Copy of every subscriber, ordered by recipient id.
    pub fn snapshot(&self) -> Vec<SubscriberSnapshot> {
        self.read()
            .iter()
            .map(|(recipient, pairs)| SubscriberSnapshot {
                recipient: *recipient,
                pairs: pairs.clone(),
            })
            .collect()
    }

    /// Number of known recipients.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
