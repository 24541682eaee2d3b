//! Tracked pair definitions.

use crate::{Currency, Locale};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Pair identifier as used by the price source (e.g., "USDTIRT").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PairId(CompactString);

impl PairId {
    pub fn new(id: &str) -> Self {
        Self(CompactString::new(id))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for PairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PairId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// How one side of a pair is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyDescriptor {
    pub locale: Locale,
    pub currency: Currency,
}

impl CurrencyDescriptor {
    pub const fn new(locale: Locale, currency: Currency) -> Self {
        Self { locale, currency }
    }
}

/// A price pair tracked by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedPair {
    /// Source-side identifier
    pub id: PairId,
    /// Display for one unit of the base asset
    pub base: CurrencyDescriptor,
    /// Display for the quoted price
    pub quote: CurrencyDescriptor,
}

impl TrackedPair {
    pub fn new(id: &str, base: CurrencyDescriptor, quote: CurrencyDescriptor) -> Self {
        Self {
            id: PairId::new(id),
            base,
            quote,
        }
    }

    /// Tether priced in Rial.
    pub fn usdt_irt() -> Self {
        Self::new(
            "USDTIRT",
            CurrencyDescriptor::new(Locale::EnUs, Currency::USD),
            CurrencyDescriptor::new(Locale::FaIr, Currency::IRR),
        )
    }

    /// Bitcoin priced in Rial.
    pub fn btc_irt() -> Self {
        Self::new(
            "BTCIRT",
            CurrencyDescriptor::new(Locale::EnUs, Currency::BTC),
            CurrencyDescriptor::new(Locale::FaIr, Currency::IRR),
        )
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PairTableError {
    #[error("Pair table is empty")]
    Empty,
    #[error("Duplicate pair id: {0}")]
    Duplicate(String),
}

/// The fixed set of tracked pairs, in display order.
#[derive(Debug, Clone, PartialEq)]
pub struct PairTable {
    pairs: Vec<TrackedPair>,
}

impl PairTable {
    /// Build a table, rejecting empty input and duplicate ids.
    pub fn new(pairs: Vec<TrackedPair>) -> Result<Self, PairTableError> {
        if pairs.is_empty() {
            return Err(PairTableError::Empty);
        }
        for (i, pair) in pairs.iter().enumerate() {
            if pairs[..i].iter().any(|p| p.id == pair.id) {
                return Err(PairTableError::Duplicate(pair.id.to_string()));
            }
        }
        Ok(Self { pairs })
    }

    /// Get a pair by id.
    pub fn get(&self, id: &str) -> Option<&TrackedPair> {
        self.pairs.iter().find(|p| p.id.as_str() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedPair> {
        self.pairs.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &PairId> {
        self.pairs.iter().map(|p| &p.id)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl Default for PairTable {
    fn default() -> Self {
        Self {
            pairs: vec![TrackedPair::usdt_irt(), TrackedPair::btc_irt()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let table = PairTable::default();
        assert_eq!(table.len(), 2);
        assert!(table.contains("USDTIRT"));
        assert!(table.contains("BTCIRT"));
        assert!(!table.contains("ETHIRT"));
    }

    #[test]
    fn test_table_keeps_order() {
        let table = PairTable::default();
        let ids: Vec<&str> = table.ids().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec!["USDTIRT", "BTCIRT"]);
    }

    #[test]
    fn test_table_rejects_duplicates() {
        let err = PairTable::new(vec![TrackedPair::usdt_irt(), TrackedPair::usdt_irt()])
            .unwrap_err();
        assert_eq!(err, PairTableError::Duplicate("USDTIRT".to_string()));
    }

    #[test]
    fn test_table_rejects_empty() {
        assert_eq!(PairTable::new(Vec::new()).unwrap_err(), PairTableError::Empty);
    }

    #[test]
    fn test_pair_deserialize() {
        let json = r#"{
            "id": "ETHIRT",
            "base": {"locale": "en-US", "currency": "ETH"},
            "quote": {"locale": "fa-IR", "currency": "IRR"}
        }"#;
        let pair: TrackedPair = serde_json::from_str(json).unwrap();
        assert_eq!(pair.id.as_str(), "ETHIRT");
        assert_eq!(pair.base.currency, Currency::ETH);
        assert_eq!(pair.quote.locale, Locale::FaIr);
    }
}
