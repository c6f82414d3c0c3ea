//! Collaborator contracts
//!
//! The engine's boundary is a small set of synchronous contracts it calls
//! into. Implementations may block (database lookups); the engine adds no
//! retry logic of its own and propagates collaborator failures unchanged.

use rust_decimal::Decimal;
use shared::{Currency, SaleItem};

use crate::error::CalculationError;

/// Resolved subject (product) identity behind a sale item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub id: String,
}

/// Resolves the subject a sale item refers to
pub trait SubjectResolver {
    fn resolve(&self, item: &SaleItem) -> Option<Subject>;
}

/// Resolves from the item's own subject reference
#[derive(Debug, Default)]
pub struct ItemSubjectResolver;

impl SubjectResolver for ItemSubjectResolver {
    fn resolve(&self, item: &SaleItem) -> Option<Subject> {
        item.subject.as_ref().map(|id| Subject { id: id.clone() })
    }
}

/// Guesses a unit purchase cost when no stock assignment backs an item
///
/// `shipping` selects the freight component instead of the product
/// component.
pub trait PurchaseCostGuesser {
    fn guess_unit_cost(
        &self,
        subject: &Subject,
        currency: &Currency,
        shipping: bool,
    ) -> Option<Decimal>;
}

/// Never guesses; unassigned quantities cost zero
#[derive(Debug, Default)]
pub struct NoPurchaseCostGuesser;

impl PurchaseCostGuesser for NoPurchaseCostGuesser {
    fn guess_unit_cost(&self, _: &Subject, _: &Currency, _: bool) -> Option<Decimal> {
        None
    }
}

/// Reports the quantities actually invoiced and credited for an item
pub trait InvoiceQuantityResolver {
    fn invoiced_quantity(&self, item: &SaleItem) -> Decimal;
    fn credited_quantity(&self, item: &SaleItem) -> Decimal;
}

/// Treats everything sold as invoiced and nothing as credited
#[derive(Debug, Default)]
pub struct SoldQuantityResolver;

impl InvoiceQuantityResolver for SoldQuantityResolver {
    fn invoiced_quantity(&self, item: &SaleItem) -> Decimal {
        item.quantity()
    }

    fn credited_quantity(&self, _: &SaleItem) -> Decimal {
        Decimal::ZERO
    }
}

/// Converts an amount between currencies (rate sourcing is a black box)
pub trait CurrencyConverter {
    fn convert(
        &self,
        amount: Decimal,
        from: &Currency,
        to: &Currency,
    ) -> Result<Decimal, CalculationError>;
}

/// Pass-through for same-currency requests; anything else is a mismatch
#[derive(Debug, Default)]
pub struct IdentityConverter;

impl CurrencyConverter for IdentityConverter {
    fn convert(
        &self,
        amount: Decimal,
        from: &Currency,
        to: &Currency,
    ) -> Result<Decimal, CalculationError> {
        if from == to {
            Ok(amount)
        } else {
            Err(CalculationError::CurrencyMismatch {
                expected: from.code().to_string(),
                found: to.code().to_string(),
            })
        }
    }
}
