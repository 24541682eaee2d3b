//! Price source abstraction.

use crate::FeedError;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Result type for price source operations.
pub type FeedResult<T> = Result<T, FeedError>;

/// Anything that can quote a pair by id.
///
/// Implementations must bound their own latency; a call that never
/// completes stalls the tick that issued it.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetch the current price of one base unit, in quote currency.
    async fn fetch_quote(&self, pair_id: &str) -> FeedResult<f64>;
}

/// Mock price source for testing.
#[derive(Default)]
pub struct MockPriceSource {
    /// Prices returned per pair id.
    pub prices: HashMap<String, f64>,
    /// Pair ids that fail.
    pub failing: HashSet<String>,
    /// Artificial latency per call.
    pub delay: Option<Duration>,
    calls: AtomicUsize,
    requested: Mutex<Vec<String>>,
}

impl MockPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a price.
    pub fn with_price(mut self, pair_id: &str, price: f64) -> Self {
        self.prices.insert(pair_id.to_string(), price);
        self
    }

    /// Make a pair fail.
    pub fn with_failure(mut self, pair_id: &str) -> Self {
        self.failing.insert(pair_id.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `fetch_quote` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Pair ids requested so far, in call order.
    pub fn requested(&self) -> Vec<String> {
        self.requested
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PriceSource for MockPriceSource {
    async fn fetch_quote(&self, pair_id: &str) -> FeedResult<f64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(pair_id.to_string());
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.contains(pair_id) {
            return Err(FeedError::ConnectionFailed(format!("Mock failure for {}", pair_id)));
        }

        self.prices
            .get(pair_id)
            .copied()
            .ok_or_else(|| FeedError::EmptyBook(pair_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_returns_price() {
        let source = MockPriceSource::new().with_price("USDTIRT", 58000.0);
        let price = source.fetch_quote("USDTIRT").await.unwrap();
        assert_eq!(price, 58000.0);
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let source = MockPriceSource::new()
            .with_price("BTCIRT", 1.0)
            .with_failure("BTCIRT");
        assert!(source.fetch_quote("BTCIRT").await.is_err());
        assert!(source.fetch_quote("UNKNOWN").await.is_err());
        assert_eq!(source.requested(), vec!["BTCIRT", "UNKNOWN"]);
    }
}
