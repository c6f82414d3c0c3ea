//! Margin Calculator
//!
//! Combines the amount calculator (revenue side) and the cost calculator
//! (purchase side) for the same node into a `Margin`.
//!
//! Two modes:
//! - default: unrestricted full amounts
//! - profit mode: both sides restricted to the quantity actually invoiced
//!   minus credited, per the invoice-quantity collaborator
//!
//! A margin can be reported in a currency other than the sale's; both
//! sides are then converted through the currency-converter collaborator
//! before the figures are derived.

use std::sync::Arc;

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use shared::{Currency, Sale, SaleItem};

use crate::amount::AmountCalculator;
use crate::costing::{CostCalculator, Revenue};
use crate::error::CalculationError;
use crate::money;
use crate::resolver::{
    CurrencyConverter, IdentityConverter, InvoiceQuantityResolver, PurchaseCostGuesser,
    SoldQuantityResolver, SubjectResolver,
};

/// Percentages are not monetary; they always round to two decimals
const PERCENT_DECIMAL_PLACES: u32 = 2;

/// Revenue minus cost for one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Margin {
    pub currency: Currency,
    /// Monetary margin, rounded to currency precision
    pub amount: Decimal,
    /// Margin as a percentage of revenue, zero when revenue is not
    /// positive
    pub percent: Decimal,
    /// Whether the cost side contains weighted-average figures
    pub average: bool,
}

/// Profitability calculator over the amount and cost calculators
pub struct MarginCalculator {
    currency: Currency,
    amounts: AmountCalculator,
    costs: CostCalculator,
    invoice_quantities: Arc<dyn InvoiceQuantityResolver>,
    converter: Arc<dyn CurrencyConverter>,
    target_currency: Option<Currency>,
    profit_mode: bool,
}

impl MarginCalculator {
    pub fn new(
        currency: Currency,
        resolver: Arc<dyn SubjectResolver>,
        guesser: Arc<dyn PurchaseCostGuesser>,
    ) -> Self {
        Self {
            amounts: AmountCalculator::new(currency.clone()),
            costs: CostCalculator::new(currency.clone(), resolver, guesser),
            invoice_quantities: Arc::new(SoldQuantityResolver),
            converter: Arc::new(IdentityConverter),
            target_currency: None,
            profit_mode: false,
            currency,
        }
    }

    /// Restrict both sides to invoiced-minus-credited quantities
    pub fn with_profit_mode(mut self, resolver: Arc<dyn InvoiceQuantityResolver>) -> Self {
        self.invoice_quantities = resolver;
        self.profit_mode = true;
        self
    }

    /// Report margins in another currency, converting through `converter`
    pub fn in_currency(mut self, target: Currency, converter: Arc<dyn CurrencyConverter>) -> Self {
        self.target_currency = Some(target);
        self.converter = converter;
        self
    }

    // ==================== Entry Points ====================

    /// Margin of one item (and its subtree)
    pub fn calculate_sale_item(&self, item: &SaleItem) -> Result<Margin, CalculationError> {
        let amount = self.amounts.calculate_sale_item(item)?;
        let cost = self.costs.calculate_sale_item(item)?;

        let ratio = self.invoiced_ratio(item);
        let revenue = Revenue::new(amount.base * ratio, Decimal::ZERO);
        self.build(revenue, cost.total() * ratio, cost.average)
    }

    /// Margin of the whole sale, shipment included
    pub fn calculate_sale(&self, sale: &Sale) -> Result<Margin, CalculationError> {
        let amounts = self.amounts.calculate_sale(sale)?;
        let sale_cost = self.costs.calculate_sale(sale)?;

        let (product_revenue, product_cost, average) = if self.profit_mode {
            // Per-item restriction, then the sale-level discount factor on
            // the revenue side
            let factor = if amounts.gross.base == Decimal::ZERO {
                Decimal::ONE
            } else {
                amounts.final_result.base / amounts.gross.base
            };
            let mut revenue = Decimal::ZERO;
            let mut cost_total = Decimal::ZERO;
            let mut average = false;
            for item in &sale.items {
                let amount = self.amounts.calculate_sale_item(item)?;
                let cost = self.costs.calculate_sale_item(item)?;
                let ratio = self.invoiced_ratio(item);
                revenue += amount.base * ratio;
                cost_total += (cost.product + cost.supply) * ratio;
                average = average || cost.average;
            }
            (revenue * factor, cost_total, average)
        } else {
            (
                amounts.final_result.base,
                sale_cost.product + sale_cost.supply,
                sale_cost.average,
            )
        };

        let revenue = Revenue::new(product_revenue, amounts.shipment.base);
        self.build(revenue, product_cost + sale_cost.shipment, average)
    }

    /// Margin of the shipment line alone; `None` when the sale has no
    /// shipment, to tell "not applicable" apart from break-even
    pub fn calculate_sale_shipment(
        &self,
        sale: &Sale,
    ) -> Result<Option<Margin>, CalculationError> {
        let Some(shipment) = &sale.shipment else {
            return Ok(None);
        };

        let amount = self.amounts.calculate_sale_shipment(sale)?;
        let cost = shipment.cost.unwrap_or(Decimal::ZERO);
        let revenue = Revenue::new(Decimal::ZERO, amount.base);

        Ok(Some(self.build(revenue, cost, false)?))
    }

    // ==================== Derivation ====================

    fn invoiced_ratio(&self, item: &SaleItem) -> Decimal {
        if !self.profit_mode {
            return Decimal::ONE;
        }
        let sold = item.quantity();
        if sold <= Decimal::ZERO {
            return Decimal::ONE;
        }
        let effective = self.invoice_quantities.invoiced_quantity(item)
            - self.invoice_quantities.credited_quantity(item);
        (effective / sold)
            .max(Decimal::ZERO)
            .min(Decimal::ONE)
    }

    fn build(
        &self,
        revenue: Revenue,
        cost_total: Decimal,
        average: bool,
    ) -> Result<Margin, CalculationError> {
        let mut revenue_total = revenue.total();
        let mut cost_total = cost_total;

        let currency = match &self.target_currency {
            Some(target) if *target != self.currency => {
                revenue_total = self
                    .converter
                    .convert(revenue_total, &self.currency, target)?;
                cost_total = self.converter.convert(cost_total, &self.currency, target)?;
                target.clone()
            }
            _ => self.currency.clone(),
        };

        let margin = revenue_total - cost_total;
        let percent = if revenue_total > Decimal::ZERO {
            (Decimal::ONE_HUNDRED * margin / revenue_total).round_dp_with_strategy(
                PERCENT_DECIMAL_PLACES,
                RoundingStrategy::MidpointAwayFromZero,
            )
        } else {
            Decimal::ZERO
        };

        Ok(Margin {
            amount: money::round(margin, &currency),
            percent,
            average,
            currency,
        })
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::to_decimal;
    use crate::resolver::{ItemSubjectResolver, NoPurchaseCostGuesser, Subject};
    use shared::{Shipment, StockAssignment, TaxRate};

    fn line(id: &str, unit_price: f64, quantity: f64) -> SaleItem {
        SaleItem::line(id, id, to_decimal(unit_price), to_decimal(quantity))
    }

    fn lot(quantity: f64, net_price: f64) -> StockAssignment {
        StockAssignment::new(to_decimal(quantity), to_decimal(net_price), Decimal::ZERO)
    }

    fn calc() -> MarginCalculator {
        MarginCalculator::new(
            Currency::eur(),
            Arc::new(ItemSubjectResolver),
            Arc::new(NoPurchaseCostGuesser),
        )
    }

    #[test]
    fn test_item_margin() {
        // Revenue 100.00, cost 60.00 -> margin 40.00, 40%
        let item = line("item-1", 100.0, 1.0)
            .with_taxes(vec![TaxRate::new("VAT 20%", to_decimal(20.0))])
            .with_stock_assignments(vec![lot(1.0, 60.0)]);

        let margin = calc().calculate_sale_item(&item).unwrap();

        // Margin compares the net base, taxes play no part
        assert_eq!(margin.amount, to_decimal(40.0));
        assert_eq!(margin.percent, to_decimal(40.0));
        assert!(!margin.average);
    }

    #[test]
    fn test_negative_margin() {
        let item = line("item-1", 10.0, 1.0).with_stock_assignments(vec![lot(1.0, 12.0)]);

        let margin = calc().calculate_sale_item(&item).unwrap();

        assert_eq!(margin.amount, to_decimal(-2.0));
        assert_eq!(margin.percent, to_decimal(-20.0));
    }

    #[test]
    fn test_percent_is_zero_without_revenue() {
        // Zero revenue with real cost: the loss is absolute, not relative
        let item = line("item-1", 0.0, 1.0).with_stock_assignments(vec![lot(1.0, 5.0)]);

        let margin = calc().calculate_sale_item(&item).unwrap();

        assert_eq!(margin.amount, to_decimal(-5.0));
        assert_eq!(margin.percent, Decimal::ZERO);
    }

    #[test]
    fn test_average_cost_marks_the_margin() {
        let item = line("item-1", 100.0, 2.0)
            .with_stock_assignments(vec![lot(1.0, 60.0), lot(1.0, 62.0)]);

        let margin = calc().calculate_sale_item(&item).unwrap();
        assert!(margin.average);
    }

    #[test]
    fn test_sale_margin_includes_shipment() {
        // Items: revenue 100.00, cost 60.00
        // Shipment: revenue 7.50, carrier cost 3.00
        let sale = Sale::new("O-0001", Currency::eur())
            .with_items(vec![
                line("item-1", 100.0, 1.0).with_stock_assignments(vec![lot(1.0, 60.0)]),
            ])
            .with_shipment(Shipment::new(to_decimal(7.5)).with_cost(to_decimal(3.0)));

        let margin = calc().calculate_sale(&sale).unwrap();

        // (100 + 7.50) - (60 + 3.00) = 44.50; 44.50 / 107.50 = 41.40%
        assert_eq!(margin.amount, to_decimal(44.5));
        assert_eq!(margin.percent, to_decimal(41.4));
    }

    #[test]
    fn test_sale_margin_uses_discounted_revenue() {
        // 10% sale discount shrinks the revenue side to 90.00
        let sale = Sale::new("O-0001", Currency::eur())
            .with_items(vec![
                line("item-1", 100.0, 1.0).with_stock_assignments(vec![lot(1.0, 60.0)]),
            ])
            .with_discounts(vec![to_decimal(10.0)]);

        let margin = calc().calculate_sale(&sale).unwrap();

        assert_eq!(margin.amount, to_decimal(30.0));
        assert_eq!(margin.percent, to_decimal(33.33));
    }

    #[test]
    fn test_shipment_margin() {
        let sale = Sale::new("O-0001", Currency::eur())
            .with_items(vec![line("item-1", 100.0, 1.0)])
            .with_shipment(Shipment::new(to_decimal(7.5)).with_cost(to_decimal(3.0)));

        let margin = calc().calculate_sale_shipment(&sale).unwrap().unwrap();

        assert_eq!(margin.amount, to_decimal(4.5));
        assert_eq!(margin.percent, to_decimal(60.0));
    }

    #[test]
    fn test_shipment_margin_is_none_without_shipment() {
        let sale = Sale::new("O-0001", Currency::eur()).with_items(vec![line("i", 10.0, 1.0)]);

        assert!(calc().calculate_sale_shipment(&sale).unwrap().is_none());
    }

    #[test]
    fn test_profit_mode_restricts_to_invoiced_quantity() {
        struct HalfInvoiced;
        impl InvoiceQuantityResolver for HalfInvoiced {
            fn invoiced_quantity(&self, item: &SaleItem) -> Decimal {
                item.quantity() / Decimal::from(2)
            }
            fn credited_quantity(&self, _: &SaleItem) -> Decimal {
                Decimal::ZERO
            }
        }

        // Sold 2, invoiced 1: both sides halve, the percentage holds
        let item = line("item-1", 100.0, 2.0).with_stock_assignments(vec![lot(2.0, 60.0)]);

        let margin = calc()
            .with_profit_mode(Arc::new(HalfInvoiced))
            .calculate_sale_item(&item)
            .unwrap();

        assert_eq!(margin.amount, to_decimal(40.0));
        assert_eq!(margin.percent, to_decimal(40.0));
    }

    #[test]
    fn test_profit_mode_clamps_overinvoicing() {
        struct OverInvoiced;
        impl InvoiceQuantityResolver for OverInvoiced {
            fn invoiced_quantity(&self, item: &SaleItem) -> Decimal {
                item.quantity() * Decimal::from(3)
            }
            fn credited_quantity(&self, _: &SaleItem) -> Decimal {
                Decimal::ZERO
            }
        }

        let item = line("item-1", 100.0, 1.0).with_stock_assignments(vec![lot(1.0, 60.0)]);

        let margin = calc()
            .with_profit_mode(Arc::new(OverInvoiced))
            .calculate_sale_item(&item)
            .unwrap();

        // Clamped to the sold quantity
        assert_eq!(margin.amount, to_decimal(40.0));
    }

    #[test]
    fn test_margin_in_another_currency() {
        struct DoubleRate;
        impl CurrencyConverter for DoubleRate {
            fn convert(
                &self,
                amount: Decimal,
                _: &Currency,
                _: &Currency,
            ) -> Result<Decimal, CalculationError> {
                Ok(amount * Decimal::from(2))
            }
        }

        let item = line("item-1", 100.0, 1.0).with_stock_assignments(vec![lot(1.0, 60.0)]);

        let margin = calc()
            .in_currency(Currency::usd(), Arc::new(DoubleRate))
            .calculate_sale_item(&item)
            .unwrap();

        assert_eq!(margin.currency, Currency::usd());
        assert_eq!(margin.amount, to_decimal(80.0));
        // Relative profitability is unchanged by conversion
        assert_eq!(margin.percent, to_decimal(40.0));
    }

    #[test]
    fn test_guessed_costs_feed_the_margin() {
        struct FixedGuesser;
        impl PurchaseCostGuesser for FixedGuesser {
            fn guess_unit_cost(
                &self,
                _: &Subject,
                _: &Currency,
                shipping: bool,
            ) -> Option<Decimal> {
                (!shipping).then(|| to_decimal(70.0))
            }
        }

        let item = line("item-1", 100.0, 1.0).with_subject("prod-1");
        let calculator = MarginCalculator::new(
            Currency::eur(),
            Arc::new(ItemSubjectResolver),
            Arc::new(FixedGuesser),
        );

        let margin = calculator.calculate_sale_item(&item).unwrap();
        assert_eq!(margin.amount, to_decimal(30.0));
    }
}
