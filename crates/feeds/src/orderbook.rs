//! REST order-book price source.
//!
//! Quotes a pair by its best ask, rounded to whole units of the quote
//! currency. Expected payload:
//! `{"status":"ok","asks":[["price","amount"],...],"bids":[...]}`

use crate::{FeedError, FeedResult, PriceSource};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Configuration for the order-book client.
#[derive(Debug, Clone)]
pub struct OrderBookConfig {
    /// API root, without trailing slash
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for OrderBookConfig {
    fn default() -> Self {
        Self {
            base_url: OrderBookSource::DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Order-book REST fetcher.
pub struct OrderBookSource {
    client: reqwest::Client,
    base_url: String,
}

impl OrderBookSource {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.nobitex.ir";

    /// Create a source whose requests time out after `config.timeout`.
    pub fn new(config: OrderBookConfig) -> FeedResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FeedError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Order-book URL for a pair.
    pub fn url_for(&self, pair_id: &str) -> String {
        format!("{}/v3/orderbook/{}", self.base_url, pair_id)
    }
}

#[async_trait]
impl PriceSource for OrderBookSource {
    async fn fetch_quote(&self, pair_id: &str) -> FeedResult<f64> {
        let url = self.url_for(pair_id);
        debug!(pair = pair_id, url = %url, "Fetching order book");

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(FeedError::HttpStatus(response.status().as_u16()));
        }

        let json: serde_json::Value = response.json().await?;
        parse_best_ask(pair_id, &json)
    }
}

/// Extract the best ask from an order-book payload, rounded to an integer.
pub fn parse_best_ask(pair_id: &str, json: &serde_json::Value) -> FeedResult<f64> {
    if let Some(status) = json["status"].as_str() {
        if status != "ok" {
            let message = json["message"].as_str().unwrap_or(status);
            return Err(FeedError::SourceStatus(message.to_string()));
        }
    }

    let asks = json["asks"]
        .as_array()
        .ok_or_else(|| FeedError::ParseError("No asks array".to_string()))?;
    let best_ask = asks
        .first()
        .ok_or_else(|| FeedError::EmptyBook(pair_id.to_string()))?;

    // Prices arrive as strings, but tolerate bare numbers
    let price = match &best_ask[0] {
        serde_json::Value::String(s) => s
            .parse::<f64>()
            .map_err(|_| FeedError::InvalidPrice(s.clone()))?,
        serde_json::Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| FeedError::InvalidPrice(n.to_string()))?,
        other => return Err(FeedError::InvalidPrice(other.to_string())),
    };

    if !price.is_finite() || price <= 0.0 {
        return Err(FeedError::InvalidPrice(price.to_string()));
    }

    Ok(price.round())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_best_ask_rounds() {
        let payload = json!({
            "status": "ok",
            "asks": [["580004.6", "12.5"], ["580100", "1"]],
            "bids": [["579000", "3"]]
        });
        assert_eq!(parse_best_ask("USDTIRT", &payload).unwrap(), 580005.0);
    }

    #[test]
    fn test_parse_numeric_price() {
        let payload = json!({"status": "ok", "asks": [[58000.2, 1.0]]});
        assert_eq!(parse_best_ask("USDTIRT", &payload).unwrap(), 58000.0);
    }

    #[test]
    fn test_parse_empty_book() {
        let payload = json!({"status": "ok", "asks": [], "bids": []});
        let err = parse_best_ask("BTCIRT", &payload).unwrap_err();
        assert!(matches!(err, FeedError::EmptyBook(ref p) if p == "BTCIRT"));
    }

    #[test]
    fn test_parse_failed_status() {
        let payload = json!({"status": "failed", "message": "Invalid symbol"});
        let err = parse_best_ask("XIRT", &payload).unwrap_err();
        assert!(matches!(err, FeedError::SourceStatus(ref m) if m == "Invalid symbol"));
    }

    #[test]
    fn test_parse_invalid_price() {
        let payload = json!({"status": "ok", "asks": [["abc", "1"]]});
        assert!(matches!(
            parse_best_ask("USDTIRT", &payload),
            Err(FeedError::InvalidPrice(_))
        ));

        let payload = json!({"status": "ok", "asks": [["0", "1"]]});
        assert!(parse_best_ask("USDTIRT", &payload).is_err());
    }

    #[test]
    fn test_parse_missing_asks() {
        let payload = json!({"status": "ok"});
        assert!(matches!(
            parse_best_ask("USDTIRT", &payload),
            Err(FeedError::ParseError(_))
        ));
    }

    #[test]
    fn test_url_for_trims_slash() {
        let source = OrderBookSource::new(OrderBookConfig {
            base_url: "https://example.test/".to_string(),
            timeout: Duration::from_secs(1),
        })
        .unwrap();
        assert_eq!(source.url_for("BTCIRT"), "https://example.test/v3/orderbook/BTCIRT");
    }

    #[tokio::test]
    async fn test_fetch_live_orderbook() {
        // This is an integration test - requires network
        let source = OrderBookSource::new(OrderBookConfig::default()).unwrap();
        if let Ok(price) = source.fetch_quote("USDTIRT").await {
            assert!(price > 0.0);
            assert_eq!(price, price.round());
        }
        // Don't fail if network is unavailable
    }
}
