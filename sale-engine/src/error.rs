//! Calculation errors
//!
//! Fatal configuration errors mean the caller constructed an invalid sale
//! item tree; the engine never recovers or returns partial results for
//! them. Collaborator failures propagate unchanged. Arithmetic edge cases
//! (zero quantities, empty sales, missing shipments) are not errors.

use thiserror::Error;

/// Error raised by the calculators
#[derive(Debug, Error)]
pub enum CalculationError {
    /// A sale's root item is private; private items have no standalone
    /// meaning at sale granularity
    #[error("root item '{item_id}' of a sale must not be private")]
    PrivateRoot { item_id: String },

    /// Two results with different currencies were merged
    #[error("currency mismatch: expected {expected}, found {found}")]
    CurrencyMismatch { expected: String, found: String },

    /// Aggregated children carry conflicting tax rates and the
    /// aggregating item declares no tax context of its own
    #[error("conflicting tax rates under item '{item_id}' with no tax context to reconcile them")]
    TaxGroupMismatch { item_id: String },

    /// The item graph revisits a node; items must form a tree
    #[error("cycle detected in sale item graph at '{item_id}'")]
    CycleDetected { item_id: String },

    /// A collaborator (resolver, guesser, converter) failed
    #[error("collaborator failure: {0}")]
    Collaborator(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl CalculationError {
    /// Wrap a collaborator error for propagation
    pub fn collaborator(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Collaborator(Box::new(err))
    }
}
