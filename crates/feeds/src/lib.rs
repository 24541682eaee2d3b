//! Price sources for tracked pairs.
//!
//! - `source` - the `PriceSource` trait and a mock for tests
//! - `orderbook` - REST order-book adapter quoting the best ask

pub mod error;
pub mod orderbook;
pub mod source;

pub use error::*;
pub use orderbook::*;
pub use source::*;
