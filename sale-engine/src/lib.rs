//! Sale calculation engine
//!
//! Calculators and value objects for the monetary side of a sale:
//!
//! - **Money rounding** (`money`): decimal arithmetic rounded at currency
//!   precision boundaries
//! - **Amounts** (`amount`): per-node unit/gross/discount/base/tax/total
//!   breakdowns with rounding reconciliation
//! - **Costs** (`costing`): purchase-side aggregates from stock
//!   assignments or guessed unit costs
//! - **Margins** (`margin`): revenue minus cost, per item, sale and
//!   shipment
//! - **Collaborators** (`resolver`): contracts the engine calls into for
//!   subject resolution, cost guessing, invoiced quantities and currency
//!   conversion
//!
//! # Module structure
//!
//! ```text
//! sale-engine/src/
//! ├── money.rs       # rounding utility, conversion guards
//! ├── amount/        # Adjustment, Amount, amount calculator
//! ├── costing/       # Cost, Revenue, item cost calculator
//! ├── margin/        # Margin, margin calculator
//! ├── resolver.rs    # collaborator traits
//! └── error.rs       # calculation errors
//! ```

pub mod amount;
pub mod costing;
pub mod error;
pub mod margin;
pub mod money;
pub mod resolver;

// Re-export public types
pub use amount::{Adjustment, Amount, AmountCalculator, SaleAmounts};
pub use costing::{Cost, CostCalculator, Revenue};
pub use error::CalculationError;
pub use margin::{Margin, MarginCalculator};
pub use resolver::{
    CurrencyConverter, InvoiceQuantityResolver, PurchaseCostGuesser, Subject, SubjectResolver,
};
