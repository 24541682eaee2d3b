//! Locale-aware price line formatting.
//!
//! Everything here is pure: the same pair, quote and descriptors always
//! render to the same string.

use crate::{CurrencyDescriptor, Locale, PairId, TrackedPair};

/// Message shown in place of a price that could not be fetched.
pub const UNAVAILABLE_MESSAGE: &str = "Price is unavailable at the moment, please try again later.";

/// A price observed for one pair during one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Quote {
    /// Price of one base unit in quote currency
    Price(f64),
    /// Fetch failed for this tick
    Unavailable,
}

impl Quote {
    pub fn is_available(&self) -> bool {
        matches!(self, Quote::Price(_))
    }
}

impl<E> From<Result<f64, E>> for Quote {
    fn from(result: Result<f64, E>) -> Self {
        match result {
            Ok(price) => Quote::Price(price),
            Err(_) => Quote::Unavailable,
        }
    }
}

/// Render a number with the locale's digits and separators.
pub fn format_number(value: f64, fraction_digits: usize, locale: Locale) -> String {
    let raw = format!("{:.*}", fraction_digits, value.abs());
    let (int_part, frac_part) = match raw.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (raw.as_str(), None),
    };

    let mut out = String::with_capacity(raw.len() * 2);
    // "-0" is not a price anyone wants to see
    if value.is_sign_negative() && raw.bytes().any(|b| matches!(b, b'1'..=b'9')) {
        out.push('-');
    }

    let len = int_part.len();
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(locale.group_separator());
        }
        out.push(locale.digit(c));
    }

    if let Some(frac) = frac_part {
        out.push(locale.decimal_separator());
        out.extend(frac.chars().map(|c| locale.digit(c)));
    }

    out
}

/// Render an amount as currency according to its descriptor.
pub fn format_amount(value: f64, descriptor: CurrencyDescriptor) -> String {
    let CurrencyDescriptor { locale, currency } = descriptor;
    let number = format_number(value, currency.fraction_digits(), locale);

    match currency.symbol(locale) {
        Some(symbol) if symbol.chars().count() == 1 => format!("{}{}", symbol, number),
        Some(symbol) => format!("{}\u{a0}{}", symbol, number),
        None => format!("{}\u{a0}{}", currency.code(), number),
    }
}

/// Format the display line for one pair.
pub fn format_line(
    pair_id: &PairId,
    quote: &Quote,
    base: CurrencyDescriptor,
    quote_descriptor: CurrencyDescriptor,
) -> String {
    match quote {
        Quote::Price(value) => format!(
            "{}\n{} = {}",
            pair_id,
            format_amount(1.0, base),
            format_amount(*value, quote_descriptor)
        ),
        Quote::Unavailable => format!("{}\n{}", pair_id, UNAVAILABLE_MESSAGE),
    }
}

/// Format the display line for a tracked pair.
pub fn format_pair_line(pair: &TrackedPair, quote: &Quote) -> String {
    format_line(&pair.id, quote, pair.base, pair.quote)
}
