//! Core data types for the price digest service.

pub mod currency;
pub mod format;
pub mod pair;

pub use currency::*;
pub use format::*;
pub use pair::*;
