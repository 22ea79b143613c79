//! Budget ledger error types.

use thiserror::Error;
use uuid::Uuid;

/// Budget ledger errors.
#[derive(Debug, Error)]
pub enum BudgetError {
    /// The target period is not a valid calendar month.
    #[error("invalid budget period: {year}-{month}")]
    InvalidPeriod {
        /// Requested year.
        year: i32,
        /// Requested month.
        month: u32,
    },

    /// More than one record for the same category covers the queried
    /// interval. The ledger's invariant is broken; refuse to pick one.
    #[error("overlapping budget records for category {category_id}")]
    OverlappingBudgets {
        /// Category with conflicting records.
        category_id: Uuid,
    },
}
