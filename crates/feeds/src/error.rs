//! Error types for price fetching.

use thiserror::Error;

/// Errors that can occur while fetching a quote.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("HTTP status {0}")]
    HttpStatus(u16),

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Source reported failure: {0}")]
    SourceStatus(String),

    #[error("Order book has no asks for {0}")]
    EmptyBook(String),

    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Timeout: {0}")]
    Timeout(String),
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FeedError::Timeout(err.to_string())
        } else if err.is_decode() {
            FeedError::ParseError(err.to_string())
        } else if let Some(status) = err.status() {
            FeedError::HttpStatus(status.as_u16())
        } else {
            FeedError::ConnectionFailed(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        FeedError::ParseError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_error_is_parse_error() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(FeedError::from(err), FeedError::ParseError(_)));
    }
}
