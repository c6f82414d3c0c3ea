//! Sale item tree types
//!
//! Items form a tree: a node either carries its own price contribution
//! (`ItemKind::Line`) or is a pass-through whose totals are purely the sum
//! of its children (`ItemKind::Compound`). A `Private` child folds into its
//! parent's totals and is never surfaced at sale granularity.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::stock::StockAssignment;

/// A resolved tax rate attached to an item
///
/// Which rates apply to which item is decided upstream; the calculators
/// consume the rates as given. The ordered rate list is also the item's
/// tax context for mismatch detection during aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxRate {
    /// Display name (e.g. "VAT 20%")
    pub name: String,
    /// Percentage rate (20 = 20%)
    pub rate: Decimal,
}

impl TaxRate {
    pub fn new(name: impl Into<String>, rate: Decimal) -> Self {
        Self {
            name: name.into(),
            rate,
        }
    }
}

/// Visibility of an item at sale granularity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Visibility {
    /// Enumerable in the sale's flattened item list
    #[default]
    Public,
    /// Folded into the parent's totals, never listed at sale level
    Private,
}

/// Pricing nature of an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemKind {
    /// A priced node: unit price, quantity and cascading discount rates
    Line {
        /// Unit net price
        unit_price: Decimal,
        /// Quantity sold
        quantity: Decimal,
        /// Discount rates applied in cascade, each to the remaining base
        discount_rates: Vec<Decimal>,
    },
    /// A pass-through node with no intrinsic price of its own
    Compound,
}

/// One node of the sale item tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleItem {
    /// Stable identity within one calculation run
    pub id: String,
    /// Display name
    pub designation: String,
    pub kind: ItemKind,
    #[serde(default)]
    pub visibility: Visibility,
    /// Resolved tax rates (the item's tax context)
    #[serde(default)]
    pub tax_rates: Vec<TaxRate>,
    /// Subject (product) reference for cost resolution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Stock lots backing this item, empty when not stock-backed
    #[serde(default)]
    pub stock_assignments: Vec<StockAssignment>,
    #[serde(default)]
    pub children: Vec<SaleItem>,
}

impl SaleItem {
    /// Create a priced line item with no discounts, taxes or children
    pub fn line(
        id: impl Into<String>,
        designation: impl Into<String>,
        unit_price: Decimal,
        quantity: Decimal,
    ) -> Self {
        Self {
            id: id.into(),
            designation: designation.into(),
            kind: ItemKind::Line {
                unit_price,
                quantity,
                discount_rates: Vec::new(),
            },
            visibility: Visibility::Public,
            tax_rates: Vec::new(),
            subject: None,
            stock_assignments: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Create a compound pass-through item
    pub fn compound(id: impl Into<String>, designation: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            designation: designation.into(),
            kind: ItemKind::Compound,
            visibility: Visibility::Public,
            tax_rates: Vec::new(),
            subject: None,
            stock_assignments: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Replace the cascading discount rates (line items only; a no-op on
    /// compound items)
    pub fn with_discounts(mut self, rates: Vec<Decimal>) -> Self {
        if let ItemKind::Line { discount_rates, .. } = &mut self.kind {
            *discount_rates = rates;
        }
        self
    }

    pub fn with_taxes(mut self, rates: Vec<TaxRate>) -> Self {
        self.tax_rates = rates;
        self
    }

    pub fn with_children(mut self, children: Vec<SaleItem>) -> Self {
        self.children = children;
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_stock_assignments(mut self, assignments: Vec<StockAssignment>) -> Self {
        self.stock_assignments = assignments;
        self
    }

    /// Mark the item private (folded into its parent at sale level)
    pub fn private(mut self) -> Self {
        self.visibility = Visibility::Private;
        self
    }

    pub fn is_private(&self) -> bool {
        self.visibility == Visibility::Private
    }

    pub fn is_compound(&self) -> bool {
        matches!(self.kind, ItemKind::Compound)
    }

    /// Quantity sold (zero for compound items)
    pub fn quantity(&self) -> Decimal {
        match &self.kind {
            ItemKind::Line { quantity, .. } => *quantity,
            ItemKind::Compound => Decimal::ZERO,
        }
    }
}
