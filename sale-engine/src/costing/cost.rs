//! Cost and Revenue value objects

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::Currency;

use crate::error::CalculationError;

/// Purchase-side aggregate for one node
///
/// `average` marks a figure derived from a weighted average across lots
/// with differing unit costs rather than an exact lot cost. Once set it
/// propagates through every merge and is never cleared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cost {
    pub currency: Currency,
    /// Product purchase cost
    pub product: Decimal,
    /// Supply (freight) cost
    pub supply: Decimal,
    /// Shipment (carrier) cost, sale level only
    pub shipment: Decimal,
    /// Whether any contributing figure is a weighted average
    pub average: bool,
}

impl Cost {
    pub fn zero(currency: Currency) -> Self {
        Self {
            currency,
            product: Decimal::ZERO,
            supply: Decimal::ZERO,
            shipment: Decimal::ZERO,
            average: false,
        }
    }

    pub fn total(&self) -> Decimal {
        self.product + self.supply + self.shipment
    }

    pub fn is_zero(&self) -> bool {
        self.product == Decimal::ZERO
            && self.supply == Decimal::ZERO
            && self.shipment == Decimal::ZERO
    }

    /// Sum two costs; a currency mismatch is fatal, never coerced
    pub fn merge(&self, other: &Cost) -> Result<Cost, CalculationError> {
        if self.currency != other.currency {
            return Err(CalculationError::CurrencyMismatch {
                expected: self.currency.code().to_string(),
                found: other.currency.code().to_string(),
            });
        }
        Ok(Cost {
            currency: self.currency.clone(),
            product: self.product + other.product,
            supply: self.supply + other.supply,
            shipment: self.shipment + other.shipment,
            average: self.average || other.average,
        })
    }
}

/// The two cost-comparable buckets of the revenue side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revenue {
    /// Net base billed for goods
    pub product: Decimal,
    /// Net base billed for shipping
    pub shipment: Decimal,
}

impl Revenue {
    pub fn new(product: Decimal, shipment: Decimal) -> Self {
        Self { product, shipment }
    }

    pub fn total(&self) -> Decimal {
        self.product + self.shipment
    }
}
