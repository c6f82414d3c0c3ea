//! Sale aggregate

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::item::{SaleItem, TaxRate};
use crate::currency::Currency;

/// Shipment charge attached to a sale
///
/// No discount ever applies to the shipment charge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    /// Amount billed to the customer
    pub amount: Decimal,
    /// Tax rates applying to the shipment charge
    #[serde(default)]
    pub tax_rates: Vec<TaxRate>,
    /// Known carrier cost, used by the margin side when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<Decimal>,
}

impl Shipment {
    pub fn new(amount: Decimal) -> Self {
        Self {
            amount,
            tax_rates: Vec::new(),
            cost: None,
        }
    }

    pub fn with_taxes(mut self, rates: Vec<TaxRate>) -> Self {
        self.tax_rates = rates;
        self
    }

    pub fn with_cost(mut self, cost: Decimal) -> Self {
        self.cost = Some(cost);
        self
    }
}

/// A sale: root items plus sale-level global adjustments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    /// Sale number (for logging and display)
    pub number: String,
    pub currency: Currency,
    pub items: Vec<SaleItem>,
    /// Sale-level discount rates, cascaded over the aggregated item base
    #[serde(default)]
    pub discounts: Vec<Decimal>,
    /// Sale-level tax rates, cascaded over the post-discount base
    #[serde(default)]
    pub taxes: Vec<TaxRate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipment: Option<Shipment>,
}

impl Sale {
    pub fn new(number: impl Into<String>, currency: Currency) -> Self {
        Self {
            number: number.into(),
            currency,
            items: Vec::new(),
            discounts: Vec::new(),
            taxes: Vec::new(),
            shipment: None,
        }
    }

    pub fn with_items(mut self, items: Vec<SaleItem>) -> Self {
        self.items = items;
        self
    }

    pub fn with_discounts(mut self, rates: Vec<Decimal>) -> Self {
        self.discounts = rates;
        self
    }

    pub fn with_taxes(mut self, rates: Vec<TaxRate>) -> Self {
        self.taxes = rates;
        self
    }

    pub fn with_shipment(mut self, shipment: Shipment) -> Self {
        self.shipment = Some(shipment);
        self
    }

    /// Depth-first list of the sale's public items
    ///
    /// Private items fold into their parents and are not enumerated at
    /// sale granularity; their subtrees are skipped entirely.
    pub fn flattened_items(&self) -> Vec<&SaleItem> {
        let mut out = Vec::new();
        for item in &self.items {
            collect_public(item, &mut out);
        }
        out
    }
}

fn collect_public<'a>(item: &'a SaleItem, out: &mut Vec<&'a SaleItem>) {
    if item.is_private() {
        return;
    }
    out.push(item);
    for child in &item.children {
        collect_public(child, out);
    }
}
