//! Money rounding utilities using rust_decimal for precision
//!
//! All calculation happens on `Decimal`; rounding is applied only at the
//! edges of each aggregation level, at the minor-unit precision of the
//! currency in play (half-up).

use rust_decimal::prelude::*;
use shared::Currency;

/// Round to the currency's minor-unit precision (half-up)
#[inline]
pub fn round(value: Decimal, currency: &Currency) -> Decimal {
    value.round_dp_with_strategy(currency.decimals(), RoundingStrategy::MidpointAwayFromZero)
}

/// Smallest representable step in the currency (0.01 for EUR, 1 for JPY)
#[inline]
pub fn tolerance(currency: &Currency) -> Decimal {
    Decimal::new(1, currency.decimals())
}

/// Compare two monetary values for equality within one minor unit
pub fn money_eq(a: Decimal, b: Decimal, currency: &Currency) -> bool {
    (a - b).abs() < tolerance(currency)
}

/// Convert f64 boundary input to Decimal for calculation
///
/// Non-finite input cannot be represented; logs an error and returns ZERO
/// rather than letting a NaN poison a monetary aggregate.
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_else(|| {
        tracing::error!(value = ?value, "non-finite f64 in monetary calculation, defaulting to zero");
        Decimal::ZERO
    })
}

/// Convert Decimal back to f64 for display, rounded to currency precision
#[inline]
pub fn to_f64(value: Decimal, currency: &Currency) -> f64 {
    round(value, currency).to_f64().unwrap_or_default()
}
