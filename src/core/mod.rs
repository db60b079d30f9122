//! Core types shared by every other module: errors, configuration, the VAT
//! rate set, canonical decimal formatting, and totals arithmetic.

mod config;
mod error;
pub mod numeric;
mod rates;
mod totals;

pub use config::*;
pub use error::*;
pub use numeric::{
    DecimalField, ZERO_CANONICAL, accepts_partial_input, canonical_decimal, canonical_or_zero,
    format_amount, line_total, parse_decimal,
};
pub use rates::*;
pub use totals::*;
