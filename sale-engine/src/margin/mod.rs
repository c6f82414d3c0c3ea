//! Margin calculation
//!
//! Profitability of an item, a sale or its shipment: revenue minus cost,
//! as an amount and as a percentage of revenue.

mod calculator;

pub use calculator::{Margin, MarginCalculator};
