//! Adjustment - one named, rated tranche of a total
//!
//! A single discount step or a single tax rate's contribution. Two
//! adjustments are the same tranche iff name and rate are equal; same
//! tranches are merged by summing their amounts, always producing a fresh
//! value rather than mutating a published one.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A named, rated monetary tranche
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    /// Display name (e.g. "Discount 7%" or "VAT 20%")
    pub name: String,
    /// Monetary amount of this tranche
    pub amount: Decimal,
    /// Percentage rate that produced the amount (7 = 7%)
    pub rate: Decimal,
}

impl Adjustment {
    pub fn new(name: impl Into<String>, amount: Decimal, rate: Decimal) -> Self {
        Self {
            name: name.into(),
            amount,
            rate,
        }
    }

    /// Same tranche: equal name and equal rate
    pub fn is_same_as(&self, other: &Adjustment) -> bool {
        self.name == other.name && self.rate == other.rate
    }

    /// Fresh adjustment with the same name and rate, different amount
    pub fn with_amount(&self, amount: Decimal) -> Adjustment {
        Adjustment {
            name: self.name.clone(),
            amount,
            rate: self.rate,
        }
    }

    /// Fresh adjustment with `amount` added to this tranche
    pub fn plus(&self, amount: Decimal) -> Adjustment {
        self.with_amount(self.amount + amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::to_decimal;

    #[test]
    fn test_is_same_as_requires_name_and_rate() {
        let a = Adjustment::new("VAT 20%", to_decimal(10.0), to_decimal(20.0));
        let same = Adjustment::new("VAT 20%", to_decimal(3.5), to_decimal(20.0));
        let other_rate = Adjustment::new("VAT 20%", to_decimal(10.0), to_decimal(10.0));
        let other_name = Adjustment::new("VAT", to_decimal(10.0), to_decimal(20.0));

        assert!(a.is_same_as(&same));
        assert!(!a.is_same_as(&other_rate));
        assert!(!a.is_same_as(&other_name));
    }

    #[test]
    fn test_plus_builds_a_fresh_value() {
        let a = Adjustment::new("Discount 7%", to_decimal(6.84), to_decimal(7.0));
        let merged = a.plus(to_decimal(1.16));

        assert_eq!(merged.amount, to_decimal(8.0));
        assert_eq!(merged.name, "Discount 7%");
        assert_eq!(merged.rate, to_decimal(7.0));
        // Original untouched
        assert_eq!(a.amount, to_decimal(6.84));
    }

    #[test]
    fn test_serialization_round_trip() {
        let a = Adjustment::new("VAT 5.5%", to_decimal(3.22), to_decimal(5.5));
        let json = serde_json::to_string(&a).unwrap();
        let deserialized: Adjustment = serde_json::from_str(&json).unwrap();

        assert_eq!(a, deserialized);
    }
}
