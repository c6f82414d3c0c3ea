//! Cost calculation
//!
//! Purchase-side aggregates: the `Cost` of an item or sale from stock
//! assignment data or guessed unit costs, and the `Revenue` restriction of
//! the amount figures that costs are compared against.

mod calculator;
mod cost;

pub use calculator::CostCalculator;
pub use cost::{Cost, Revenue};
