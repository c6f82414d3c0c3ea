//! Item Cost Calculator
//!
//! Walks the sale item tree in the same bottom-up order as the amount
//! calculator and produces a `Cost` per node:
//!
//! - an item backed by stock assignments costs the quantity-weighted sum
//!   of its lots, flagged `average` as soon as lots with differing unit
//!   costs mix
//! - quantity beyond the assigned lots falls back to the purchase-cost
//!   guesser, keyed by the resolved subject
//! - with neither source the cost is zero
//!
//! Compound and private aggregation mirror the amount calculator: a
//! compound node sums its children only, private children fold into their
//! parent, public children stand alone and still roll up.
//!
//! Costs stay unrounded; rounding happens where they are consumed (margin
//! display).

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use shared::{Currency, ItemKind, Sale, SaleItem};

use super::cost::Cost;
use crate::error::CalculationError;
use crate::resolver::{PurchaseCostGuesser, SubjectResolver};

/// Tree calculator for the purchase side of a sale
pub struct CostCalculator {
    currency: Currency,
    resolver: Arc<dyn SubjectResolver>,
    guesser: Arc<dyn PurchaseCostGuesser>,
    cache: RefCell<HashMap<String, Cost>>,
}

impl CostCalculator {
    pub fn new(
        currency: Currency,
        resolver: Arc<dyn SubjectResolver>,
        guesser: Arc<dyn PurchaseCostGuesser>,
    ) -> Self {
        Self {
            currency,
            resolver,
            guesser,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Per-item cost computed earlier in this run, if any
    pub fn cached(&self, item_id: &str) -> Option<Cost> {
        self.cache.borrow().get(item_id).cloned()
    }

    /// Drop all memoized results; required between independent runs
    pub fn clear_cache(&self) {
        self.cache.borrow_mut().clear();
    }

    /// Sum the costs of all root items, plus the known carrier cost of
    /// the shipment in the `shipment` bucket
    pub fn calculate_sale(&self, sale: &Sale) -> Result<Cost, CalculationError> {
        if sale.currency != self.currency {
            return Err(CalculationError::CurrencyMismatch {
                expected: self.currency.code().to_string(),
                found: sale.currency.code().to_string(),
            });
        }

        let mut result = Cost::zero(self.currency.clone());
        for item in &sale.items {
            if item.is_private() {
                return Err(CalculationError::PrivateRoot {
                    item_id: item.id.clone(),
                });
            }
            result = result.merge(&self.calculate_sale_item(item)?)?;
        }

        if let Some(shipment) = &sale.shipment {
            match shipment.cost {
                Some(cost) => result.shipment += cost,
                None => {
                    tracing::warn!(sale = %sale.number, "shipment has no known carrier cost");
                }
            }
        }

        Ok(result)
    }

    /// Calculate one item (and its subtree), usable on any node including
    /// private ones
    pub fn calculate_sale_item(&self, item: &SaleItem) -> Result<Cost, CalculationError> {
        let mut path = Vec::new();
        self.calculate_item(item, &mut path)
    }

    fn calculate_item(
        &self,
        item: &SaleItem,
        path: &mut Vec<String>,
    ) -> Result<Cost, CalculationError> {
        if path.iter().any(|id| id == &item.id) {
            return Err(CalculationError::CycleDetected {
                item_id: item.id.clone(),
            });
        }
        if let Some(hit) = self.cache.borrow().get(&item.id) {
            return Ok(hit.clone());
        }

        path.push(item.id.clone());
        let mut result = match &item.kind {
            ItemKind::Compound => Cost::zero(self.currency.clone()),
            ItemKind::Line { quantity, .. } => self.calculate_own(item, *quantity),
        };
        for child in &item.children {
            result = result.merge(&self.calculate_item(child, path)?)?;
        }
        path.pop();

        self.cache
            .borrow_mut()
            .insert(item.id.clone(), result.clone());
        Ok(result)
    }

    /// Cost of the item's own quantity, excluding any descendant
    /// contribution
    fn calculate_own(&self, item: &SaleItem, quantity: Decimal) -> Cost {
        let mut product = Decimal::ZERO;
        let mut supply = Decimal::ZERO;
        let mut assigned = Decimal::ZERO;
        let mut unit_costs: Vec<Decimal> = Vec::new();

        for assignment in &item.stock_assignments {
            product += assignment.quantity * assignment.net_price;
            supply += assignment.quantity * assignment.shipping_price;
            assigned += assignment.quantity;
            if !unit_costs.contains(&assignment.net_price) {
                unit_costs.push(assignment.net_price);
            }
        }

        // Anything sold beyond the assigned lots is costed by guess
        let remainder = quantity - assigned;
        if remainder > Decimal::ZERO {
            match self.resolver.resolve(item) {
                Some(subject) => {
                    match self
                        .guesser
                        .guess_unit_cost(&subject, &self.currency, false)
                    {
                        Some(unit_cost) => {
                            product += remainder * unit_cost;
                            if !unit_costs.contains(&unit_cost) {
                                unit_costs.push(unit_cost);
                            }
                        }
                        None => {
                            tracing::warn!(
                                item = %item.id,
                                subject = %subject.id,
                                "no purchase cost available, counting zero"
                            );
                        }
                    }
                    if let Some(unit_cost) =
                        self.guesser.guess_unit_cost(&subject, &self.currency, true)
                    {
                        supply += remainder * unit_cost;
                    }
                }
                None => {
                    tracing::warn!(item = %item.id, "no subject resolved, counting zero cost");
                }
            }
        }

        Cost {
            currency: self.currency.clone(),
            product,
            supply,
            shipment: Decimal::ZERO,
            // More than one distinct unit cost means a weighted figure
            average: unit_costs.len() > 1,
        }
    }
}

// ==================== Tests ====================
