//! Amount - the monetary breakdown for one node
//!
//! Seven scalar figures (unit, gross, discount, base, tax, total) plus the
//! discount and tax adjustment lists that decompose them. Amounts are
//! value objects: every operation returns a new Amount, so a child result
//! merged into several ancestors can never be corrupted through aliasing.
//!
//! Invariants enforced here:
//! - `merge` never crosses currencies
//! - after `round()`, `total == base + tax` exactly (tax is derived, not
//!   independently rounded)
//! - after `finalize()`, each adjustment list sums exactly to its
//!   aggregate scalar

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::Currency;

use super::adjustment::Adjustment;
use crate::error::CalculationError;
use crate::money;

/// Monetary result for one node of a sale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Amount {
    pub currency: Currency,
    /// Unit net price
    pub unit: Decimal,
    /// Unit price times quantity, before adjustments
    pub gross: Decimal,
    /// Total discount amount
    pub discount: Decimal,
    /// Post-discount base the taxes apply to
    pub base: Decimal,
    /// Total tax amount
    pub tax: Decimal,
    /// Base plus tax
    pub total: Decimal,
    /// Discount tranches, one per cascaded rate
    pub discounts: Vec<Adjustment>,
    /// Tax tranches, one per applied rate
    pub taxes: Vec<Adjustment>,
}

impl Amount {
    /// All-zero result in the given currency
    pub fn zero(currency: Currency) -> Self {
        Self {
            currency,
            unit: Decimal::ZERO,
            gross: Decimal::ZERO,
            discount: Decimal::ZERO,
            base: Decimal::ZERO,
            tax: Decimal::ZERO,
            total: Decimal::ZERO,
            discounts: Vec::new(),
            taxes: Vec::new(),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.unit == Decimal::ZERO
            && self.gross == Decimal::ZERO
            && self.discount == Decimal::ZERO
            && self.base == Decimal::ZERO
            && self.tax == Decimal::ZERO
            && self.total == Decimal::ZERO
    }

    // ==================== Adjustment Lists ====================

    /// Merge an adjustment into a list: sum amounts on a same tranche
    /// (equal name and rate), append otherwise
    pub(crate) fn merge_adjustment(list: &mut Vec<Adjustment>, adjustment: Adjustment) {
        if let Some(existing) = list.iter_mut().find(|a| a.is_same_as(&adjustment)) {
            *existing = existing.plus(adjustment.amount);
        } else {
            list.push(adjustment);
        }
    }

    // ==================== Merge ====================

    /// Sum two results
    ///
    /// Sums the seven scalars and merges both adjustment lists tranche by
    /// tranche. A currency mismatch is fatal, never silently converted.
    pub fn merge(&self, other: &Amount) -> Result<Amount, CalculationError> {
        if self.currency != other.currency {
            return Err(CalculationError::CurrencyMismatch {
                expected: self.currency.code().to_string(),
                found: other.currency.code().to_string(),
            });
        }

        let mut discounts = self.discounts.clone();
        for adjustment in &other.discounts {
            Self::merge_adjustment(&mut discounts, adjustment.clone());
        }
        let mut taxes = self.taxes.clone();
        for adjustment in &other.taxes {
            Self::merge_adjustment(&mut taxes, adjustment.clone());
        }

        Ok(Amount {
            currency: self.currency.clone(),
            unit: self.unit + other.unit,
            gross: self.gross + other.gross,
            discount: self.discount + other.discount,
            base: self.base + other.base,
            tax: self.tax + other.tax,
            total: self.total + other.total,
            discounts,
            taxes,
        })
    }

    /// Sum any number of results into one
    pub fn merge_all<'a>(
        currency: Currency,
        amounts: impl IntoIterator<Item = &'a Amount>,
    ) -> Result<Amount, CalculationError> {
        let mut result = Amount::zero(currency);
        for amount in amounts {
            result = result.merge(amount)?;
        }
        Ok(result)
    }

    // ==================== Rounding ====================

    /// `unit := gross`, for nodes whose unit price is not independently
    /// meaningful because their contribution was computed bottom-up
    pub fn copy_gross_to_unit(mut self) -> Amount {
        self.unit = self.gross;
        self
    }

    /// Round to currency precision
    ///
    /// Rounds unit, gross, discount, base and total; tax is then derived
    /// as `total - base` so the total decomposition holds exactly after
    /// rounding. Idempotent.
    pub fn round(&self) -> Amount {
        let base = money::round(self.base, &self.currency);
        let total = money::round(self.total, &self.currency);

        Amount {
            currency: self.currency.clone(),
            unit: money::round(self.unit, &self.currency),
            gross: money::round(self.gross, &self.currency),
            discount: money::round(self.discount, &self.currency),
            base,
            tax: total - base,
            total,
            discounts: self.discounts.clone(),
            taxes: self.taxes.clone(),
        }
    }

    // ==================== Reconciliation ====================

    /// Round, then reconcile both adjustment lists against their rounded
    /// aggregates
    ///
    /// Summing independently rounded tranches can drift a minor unit away
    /// from the rounded aggregate because rounding is not linear. The
    /// aggregate is authoritative: tranches are walked in ascending amount
    /// order, each rounded, clamped when the running sum would overshoot,
    /// and the largest tranche absorbs any remaining residual in either
    /// direction. The finalized lists are re-sorted by rate for a
    /// deterministic, currency-independent display order.
    pub fn finalize(&self) -> Amount {
        let rounded = self.round();
        let taxes = Self::reconcile(&rounded.taxes, rounded.tax, &rounded.currency);
        let discounts = Self::reconcile(&rounded.discounts, rounded.discount, &rounded.currency);

        Amount {
            discounts,
            taxes,
            ..rounded
        }
    }

    fn reconcile(
        list: &[Adjustment],
        authoritative: Decimal,
        currency: &Currency,
    ) -> Vec<Adjustment> {
        if list.is_empty() {
            return Vec::new();
        }

        let mut sorted: Vec<&Adjustment> = list.iter().collect();
        sorted.sort_by(|a, b| a.amount.cmp(&b.amount));

        let last = sorted.len() - 1;
        let mut sum = Decimal::ZERO;
        let mut out = Vec::with_capacity(sorted.len());
        for (index, adjustment) in sorted.iter().enumerate() {
            let amount = if index == last {
                // Largest tranche absorbs the residual, positive or negative
                authoritative - sum
            } else {
                let rounded = money::round(adjustment.amount, currency);
                if sum + rounded > authoritative {
                    authoritative - sum
                } else {
                    rounded
                }
            };
            sum += amount;
            out.push(adjustment.with_amount(amount));
        }

        out.sort_by(|a, b| a.rate.cmp(&b.rate));
        out
    }

    // ==================== Final Result ====================

    /// Build the sale's final result from its gross result, once the
    /// sale-level discounts have been folded into the base: discount
    /// flattens to zero and unit, gross and base all take the
    /// already-net-of-discount base
    pub fn create_final_from_gross(gross: &Amount) -> Amount {
        Amount {
            currency: gross.currency.clone(),
            unit: gross.base,
            gross: gross.base,
            discount: Decimal::ZERO,
            base: gross.base,
            tax: gross.tax,
            total: gross.base + gross.tax,
            discounts: Vec::new(),
            taxes: gross.taxes.clone(),
        }
    }
}

// ==================== Tests ====================
