//! Stock assignment data backing an item's cost

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One stock lot assigned to a sale item
///
/// Prices are per unit; `quantity` is the portion of the lot assigned to
/// the item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockAssignment {
    /// Quantity taken from this lot
    pub quantity: Decimal,
    /// Unit net purchase price
    pub net_price: Decimal,
    /// Unit freight price
    pub shipping_price: Decimal,
}

impl StockAssignment {
    pub fn new(quantity: Decimal, net_price: Decimal, shipping_price: Decimal) -> Self {
        Self {
            quantity,
            net_price,
            shipping_price,
        }
    }
}
