//! Currency and locale types for price display.

use serde::{Deserialize, Serialize};

/// Currencies that can appear on either side of a tracked pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Currency {
    /// US Dollar
    USD = 1,
    /// Tether
    USDT = 2,
    /// Bitcoin
    BTC = 3,
    /// Ether
    ETH = 4,
    /// Iranian Rial
    IRR = 10,
}

impl Currency {
    /// ISO-style currency code.
    pub fn code(self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::USDT => "USDT",
            Currency::BTC => "BTC",
            Currency::ETH => "ETH",
            Currency::IRR => "IRR",
        }
    }

    /// Number of fraction digits shown when displaying an amount.
    ///
    /// Crypto assets follow the ISO fallback of two digits, which is what a
    /// currency formatter does for codes it has no minor-unit data for.
    pub fn fraction_digits(self) -> usize {
        match self {
            Currency::IRR => 0,
            Currency::USD | Currency::USDT | Currency::BTC | Currency::ETH => 2,
        }
    }

    /// Localized symbol, if the locale has one for this currency.
    pub fn symbol(self, locale: Locale) -> Option<&'static str> {
        match (self, locale) {
            (Currency::USD, _) => Some("$"),
            (Currency::IRR, Locale::FaIr) => Some("ریال"),
            _ => None,
        }
    }
}

/// Display locale for numbers and currency symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Locale {
    #[serde(rename = "en-US")]
    EnUs,
    #[serde(rename = "fa-IR")]
    FaIr,
}

impl Locale {
    /// Digit-group separator.
    pub fn group_separator(self) -> char {
        match self {
            Locale::EnUs => ',',
            Locale::FaIr => '\u{066C}',
        }
    }

    /// Decimal separator.
    pub fn decimal_separator(self) -> char {
        match self {
            Locale::EnUs => '.',
            Locale::FaIr => '\u{066B}',
        }
    }

    /// Map an ASCII digit into this locale's digit set.
    pub fn digit(self, ascii: char) -> char {
        match self {
            Locale::EnUs => ascii,
            Locale::FaIr => match ascii.to_digit(10) {
                Some(d) => char::from_u32(0x06F0 + d).unwrap_or(ascii),
                None => ascii,
            },
        }
    }
}
