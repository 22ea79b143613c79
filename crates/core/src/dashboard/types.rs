//! Dashboard data types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether a receipt is a personal or a shared household expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseType {
    /// Personal expense.
    Personal,
    /// Shared household expense.
    Household,
}

/// Category snapshot carried into dashboard output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryInfo {
    /// Category ID.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Unique-per-household slug.
    pub slug: String,
    /// Optional icon.
    pub icon: Option<String>,
    /// Soft-delete flag.
    pub is_active: bool,
    /// UI ordering.
    pub sort_order: i32,
}

/// One category's line in the monthly breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryBreakdown {
    /// The category.
    pub category: CategoryInfo,
    /// Limit active for the month.
    pub monthly_limit: Decimal,
    /// Spend summed over the month.
    pub spent: Decimal,
    /// `limit - spent`; negative when over budget.
    pub remaining: Decimal,
    /// `spent / limit * 100` rounded to one decimal place; 0 when the
    /// limit is zero.
    pub percent_used: Decimal,
}

/// A recent receipt row as fetched from persistence, before review tagging.
#[derive(Debug, Clone)]
pub struct RecentReceiptRow {
    /// Receipt ID.
    pub id: Uuid,
    /// Merchant name.
    pub merchant_name: Option<String>,
    /// Printed transaction date.
    pub transaction_date: Option<DateTime<Utc>>,
    /// Grand total.
    pub grand_total: Decimal,
    /// Assigned category.
    pub category_id: Option<Uuid>,
    /// Expense type tag.
    pub expense_type: ExpenseType,
    /// Categorization confidence.
    pub confidence: f64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A recent receipt in dashboard output.
#[derive(Debug, Clone, Serialize)]
pub struct RecentReceipt {
    /// Receipt ID.
    pub id: Uuid,
    /// Merchant name.
    pub merchant_name: Option<String>,
    /// Printed transaction date.
    pub transaction_date: Option<DateTime<Utc>>,
    /// Grand total.
    pub grand_total: Decimal,
    /// Assigned category, resolved against the active list.
    pub category: Option<CategoryInfo>,
    /// Expense type tag.
    pub expense_type: ExpenseType,
    /// True when confidence sits strictly below the review threshold.
    pub needs_review: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// The dashboard payload for one reporting month.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    /// Reporting month as `YYYY-MM`.
    pub month: String,
    /// Sum of every active category's limit, including categories whose
    /// line is omitted from the breakdown.
    pub total_budget: Decimal,
    /// Sum of spend across all active categories with any spend, even
    /// those omitted from the breakdown.
    pub total_spent: Decimal,
    /// `total_budget - total_spent`.
    pub total_remaining: Decimal,
    /// Per-category lines; only categories with a limit or spend appear.
    pub by_category: Vec<CategoryBreakdown>,
    /// Up to 10 most recent receipts in the month.
    pub recent_receipts: Vec<RecentReceipt>,
}
