//! Sale entity tree
//!
//! The sale aggregate consumed by the calculators: a sale with global
//! adjustments and an optional shipment, over a tree of line items.

mod item;
#[allow(clippy::module_inception)]
mod sale;
mod stock;

pub use item::{ItemKind, SaleItem, TaxRate, Visibility};
pub use sale::{Sale, Shipment};
pub use stock::StockAssignment;
