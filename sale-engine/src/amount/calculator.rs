//! Amount Calculator
//!
//! Walks the sale item tree bottom-up and produces an `Amount` per node,
//! plus the sale's gross, final and shipment results:
//!
//! - a line node computes its own breakdown from unit price, quantity,
//!   cascading discount rates and parallel tax rates, then merges in every
//!   child's result
//! - a compound node contributes nothing of its own; its result is purely
//!   the sum of its children
//! - private children fold into their parent and are never enumerated at
//!   sale granularity; public children stand alone and still roll up into
//!   every ancestor
//!
//! Results are rounded and reconciled at every node. A per-run memo cache
//! keyed by item id serves repeated queries of the same node; the cache
//! must not outlive the run, so use one calculator per logical operation
//! or call `clear_cache` between runs.

use std::cell::RefCell;
use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{Currency, ItemKind, Sale, SaleItem, Shipment, TaxRate};

use super::adjustment::Adjustment;
use super::amount::Amount;
use crate::error::CalculationError;
use crate::money;

/// The three sale-level results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleAmounts {
    /// Item aggregation before sale-level adjustments
    pub gross: Amount,
    /// After sale-level discounts and taxes are cascaded on top
    pub final_result: Amount,
    /// The shipment charge as its own result, zero-valued when the sale
    /// has no shipment
    pub shipment: Amount,
}

/// Tree calculator for the revenue side of a sale
pub struct AmountCalculator {
    currency: Currency,
    cache: RefCell<HashMap<String, Amount>>,
}

impl AmountCalculator {
    pub fn new(currency: Currency) -> Self {
        Self {
            currency,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Per-item result computed earlier in this run, if any
    pub fn cached(&self, item_id: &str) -> Option<Amount> {
        self.cache.borrow().get(item_id).cloned()
    }

    /// Drop all memoized results; required between independent runs
    pub fn clear_cache(&self) {
        self.cache.borrow_mut().clear();
    }

    // ==================== Sale ====================

    /// Calculate the sale's gross, final and shipment results
    ///
    /// # Errors
    /// - `PrivateRoot` when a root item is private
    /// - `CurrencyMismatch` when the sale's currency differs from the
    ///   calculator's
    /// - `TaxGroupMismatch` / `CycleDetected` surfaced from item descent
    pub fn calculate_sale(&self, sale: &Sale) -> Result<SaleAmounts, CalculationError> {
        if sale.currency != self.currency {
            return Err(CalculationError::CurrencyMismatch {
                expected: self.currency.code().to_string(),
                found: sale.currency.code().to_string(),
            });
        }
        tracing::debug!(sale = %sale.number, currency = %sale.currency, "calculating sale amounts");

        let mut gross = Amount::zero(self.currency.clone());
        for item in &sale.items {
            // Private items have no standalone meaning at sale granularity
            if item.is_private() {
                return Err(CalculationError::PrivateRoot {
                    item_id: item.id.clone(),
                });
            }
            let amount = self.calculate_sale_item(item)?;
            gross = gross.merge(&amount)?;
        }
        let gross = gross.finalize();

        let final_result = self.calculate_final(sale, &gross)?;
        let shipment = self.calculate_sale_shipment(sale)?;

        Ok(SaleAmounts {
            gross,
            final_result,
            shipment,
        })
    }

    /// Calculate one item (and its subtree), usable on any node including
    /// private ones
    pub fn calculate_sale_item(&self, item: &SaleItem) -> Result<Amount, CalculationError> {
        let mut path = Vec::new();
        self.calculate_item(item, &mut path)
    }

    /// Calculate the shipment charge as a pseudo-line-item: no discounts,
    /// its own tax rates, zero-valued when the sale has no shipment
    pub fn calculate_sale_shipment(&self, sale: &Sale) -> Result<Amount, CalculationError> {
        let Some(shipment) = &sale.shipment else {
            return Ok(Amount::zero(self.currency.clone()));
        };
        Ok(self.calculate_shipment_charge(shipment).finalize())
    }

    // ==================== Item Descent ====================

    fn calculate_item(
        &self,
        item: &SaleItem,
        path: &mut Vec<String>,
    ) -> Result<Amount, CalculationError> {
        // Items are tree-structured by construction; a revisited id means
        // the caller wired up a cyclic graph
        if path.iter().any(|id| id == &item.id) {
            return Err(CalculationError::CycleDetected {
                item_id: item.id.clone(),
            });
        }
        if let Some(hit) = self.cache.borrow().get(&item.id) {
            return Ok(hit.clone());
        }

        path.push(item.id.clone());
        let mut children = Vec::with_capacity(item.children.len());
        for child in &item.children {
            children.push(self.calculate_item(child, path)?);
        }
        path.pop();

        let result = match &item.kind {
            ItemKind::Compound => {
                // Children fully substitute for the compound parent
                Self::check_tax_context(item, item.children.iter())?;
                Amount::merge_all(self.currency.clone(), children.iter())?.copy_gross_to_unit()
            }
            ItemKind::Line {
                unit_price,
                quantity,
                discount_rates,
            } => {
                Self::check_tax_context(item, item.children.iter().filter(|c| c.is_private()))?;
                let mut result = self.calculate_own(item, *unit_price, *quantity, discount_rates);
                for child in &children {
                    result = result.merge(child)?;
                }
                result
            }
        };

        let result = result.finalize();
        self.cache
            .borrow_mut()
            .insert(item.id.clone(), result.clone());
        Ok(result)
    }

    /// Leaf-style breakdown from the item's own price, quantity and rates,
    /// excluding any descendant contribution
    fn calculate_own(
        &self,
        item: &SaleItem,
        unit_price: Decimal,
        quantity: Decimal,
        discount_rates: &[Decimal],
    ) -> Amount {
        let currency = &self.currency;
        let unit = money::round(unit_price, currency);
        let gross = money::round(unit_price * quantity, currency);

        // Discounts cascade: each rate applies to the remaining base
        let mut discounts = Vec::new();
        let mut running = gross;
        for rate in discount_rates {
            let amount = money::round(running * *rate / Decimal::ONE_HUNDRED, currency);
            Amount::merge_adjustment(
                &mut discounts,
                Adjustment::new(format!("Discount {rate}%"), amount, *rate),
            );
            running -= amount;
        }
        let base = running;

        // Taxes apply independently, in parallel, to the post-discount base
        let mut taxes = Vec::new();
        let mut tax = Decimal::ZERO;
        for tax_rate in &item.tax_rates {
            let amount = money::round(base * tax_rate.rate / Decimal::ONE_HUNDRED, currency);
            Amount::merge_adjustment(
                &mut taxes,
                Adjustment::new(tax_rate.name.clone(), amount, tax_rate.rate),
            );
            tax += amount;
        }

        Amount {
            currency: currency.clone(),
            unit,
            gross,
            discount: gross - base,
            base,
            tax,
            total: base + tax,
            discounts,
            taxes,
        }
    }

    /// Aggregating children of mixed tax contexts is only legal when the
    /// aggregating item declares a tax context of its own; the engine
    /// never guesses a fallback rate
    fn check_tax_context<'a>(
        parent: &SaleItem,
        aggregated: impl Iterator<Item = &'a SaleItem>,
    ) -> Result<(), CalculationError> {
        if !parent.tax_rates.is_empty() {
            return Ok(());
        }
        let mut context: Option<&[TaxRate]> = None;
        for child in aggregated {
            if child.tax_rates.is_empty() {
                continue;
            }
            match context {
                None => context = Some(&child.tax_rates),
                Some(existing) if existing != child.tax_rates.as_slice() => {
                    return Err(CalculationError::TaxGroupMismatch {
                        item_id: parent.id.clone(),
                    });
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    // ==================== Sale-Level Adjustments ====================

    /// Final result: sale-level discounts cascaded over the gross base,
    /// item tax tranches scaled in proportion, sale-level taxes cascaded
    /// over the post-discount base
    fn calculate_final(&self, sale: &Sale, gross: &Amount) -> Result<Amount, CalculationError> {
        let currency = &self.currency;

        let mut running = gross.base;
        let mut discounts = Vec::new();
        for rate in &sale.discounts {
            let amount = money::round(running * *rate / Decimal::ONE_HUNDRED, currency);
            Amount::merge_adjustment(
                &mut discounts,
                Adjustment::new(format!("Discount {rate}%"), amount, *rate),
            );
            running -= amount;
        }

        // Fold the discount into the base distributively: every item-level
        // tax tranche shrinks by the combined discount factor, keeping each
        // rate's tax proportional to the base it now applies to
        let factor = if gross.base == Decimal::ZERO {
            Decimal::ONE
        } else {
            running / gross.base
        };
        let mut taxes = Vec::with_capacity(gross.taxes.len());
        let mut tax = Decimal::ZERO;
        for tranche in &gross.taxes {
            let amount = money::round(tranche.amount * factor, currency);
            tax += amount;
            taxes.push(tranche.with_amount(amount));
        }

        let folded = Amount {
            currency: currency.clone(),
            unit: gross.unit,
            gross: gross.gross,
            discount: gross.base - running,
            base: running,
            tax,
            total: running + tax,
            discounts,
            taxes,
        };

        let mut final_result = Amount::create_final_from_gross(&folded);
        for tax_rate in &sale.taxes {
            let amount =
                money::round(final_result.base * tax_rate.rate / Decimal::ONE_HUNDRED, currency);
            Amount::merge_adjustment(
                &mut final_result.taxes,
                Adjustment::new(tax_rate.name.clone(), amount, tax_rate.rate),
            );
            final_result.tax += amount;
            final_result.total += amount;
        }

        Ok(final_result.finalize())
    }

    fn calculate_shipment_charge(&self, shipment: &Shipment) -> Amount {
        let currency = &self.currency;
        let base = money::round(shipment.amount, currency);

        let mut taxes = Vec::new();
        let mut tax = Decimal::ZERO;
        for tax_rate in &shipment.tax_rates {
            let amount = money::round(base * tax_rate.rate / Decimal::ONE_HUNDRED, currency);
            Amount::merge_adjustment(
                &mut taxes,
                Adjustment::new(tax_rate.name.clone(), amount, tax_rate.rate),
            );
            tax += amount;
        }

        Amount {
            currency: currency.clone(),
            unit: base,
            gross: base,
            discount: Decimal::ZERO,
            base,
            tax,
            total: base + tax,
            discounts: Vec::new(),
            taxes,
        }
    }
}
