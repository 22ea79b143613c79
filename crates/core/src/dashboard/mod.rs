//! Monthly spending aggregation against budget limits.
//!
//! Pure reconciliation of three inputs for a reporting month: the active
//! category list, per-category spend sums, and the ledger's active limits.
//! Everything monetary is `Decimal`; the database does the summing, this
//! module does the arithmetic and shaping.

pub mod service;
pub mod types;


pub use service::build_summary;
pub use types::{
    CategoryBreakdown, CategoryInfo, DashboardSummary, ExpenseType, RecentReceipt,
    RecentReceiptRow,
};
