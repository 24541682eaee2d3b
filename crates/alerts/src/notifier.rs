//! Outbound message delivery.

use crate::registry::RecipientId;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Transport rejected message: {0}")]
    Rejected(String),
    #[error("Delivery timed out after {0:?}")]
    Timeout(Duration),
}

/// Delivers text messages to recipients.
///
/// Implementations bound their own latency and report a timeout as an error.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient: RecipientId, text: &str) -> Result<(), DeliveryError>;
}

/// Notifier that records messages instead of sending them.
#[derive(Default)]
pub struct RecordingNotifier {
    /// Recipients whose deliveries fail.
    pub failing: HashSet<RecipientId>,
    sent: Mutex<Vec<(RecipientId, String)>>,
    attempts: Mutex<Vec<RecipientId>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make deliveries to `recipient` fail.
    pub fn with_failure(mut self, recipient: RecipientId) -> Self {
        self.failing.insert(recipient);
        self
    }

    /// Successfully delivered messages, in order.
    pub fn sent(&self) -> Vec<(RecipientId, String)> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Every recipient a delivery was attempted for, including failures.
    pub fn attempts(&self) -> Vec<RecipientId> {
        self.attempts.lock().map(|a| a.clone()).unwrap_or_default()
    }

    /// Messages delivered to one recipient.
    pub fn sent_to(&self, recipient: RecipientId) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|(r, _)| *r == recipient)
            .map(|(_, text)| text)
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, recipient: RecipientId, text: &str) -> Result<(), DeliveryError> {
        if let Ok(mut attempts) = self.attempts.lock() {
            attempts.push(recipient);
        }

        if self.failing.contains(&recipient) {
            return Err(DeliveryError::Rejected("Mock failure".to_string()));
        }

        if let Ok(mut sent) = self.sent.lock() {
            sent.push((recipient, text.to_string()));
        }
        Ok(())
    }
}
