//! Shared types for the sale calculation workspace
//!
//! Common types consumed across crates: currencies, the sale entity tree
//! (sale, items, shipment) and stock assignment data. This crate holds no
//! algorithms; the calculators live in `sale-engine`.

pub mod currency;
pub mod sale;

// Re-exports
pub use currency::Currency;
pub use sale::{
    ItemKind, Sale, SaleItem, Shipment, StockAssignment, TaxRate, Visibility,
};
pub use serde::{Deserialize, Serialize};
