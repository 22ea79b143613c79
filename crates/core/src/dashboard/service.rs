//! Dashboard assembly.

use std::collections::HashMap;

use rust_decimal::Decimal;
use uuid::Uuid;

use super::types::{
    CategoryBreakdown, CategoryInfo, DashboardSummary, RecentReceipt, RecentReceiptRow,
};
use crate::budget::TargetPeriod;

/// Builds the dashboard payload for one reporting month.
///
/// `categories` must be the household's active list in sort order;
/// `spent_by_category` and `limits` are keyed by category ID for the same
/// month. A category contributes to the totals whenever it has a limit or
/// spend, but only earns a breakdown line when `limit > 0 OR spent > 0` —
/// spend against a limit-less category is counted in `total_spent` while
/// its line is omitted. That asymmetry is intentional; do not "fix" it
/// without a product decision.
#[must_use]
pub fn build_summary(
    period: TargetPeriod,
    categories: &[CategoryInfo],
    spent_by_category: &HashMap<Uuid, Decimal>,
    limits: &HashMap<Uuid, Decimal>,
    recent: Vec<RecentReceiptRow>,
    confidence_threshold: f64,
) -> DashboardSummary {
    let mut by_category = Vec::new();
    let mut total_budget = Decimal::ZERO;
    let mut total_spent = Decimal::ZERO;

    for category in categories {
        let limit = limits.get(&category.id).copied().unwrap_or(Decimal::ZERO);
        let spent = spent_by_category
            .get(&category.id)
            .copied()
            .unwrap_or(Decimal::ZERO);

        total_budget += limit;
        total_spent += spent;

        if limit > Decimal::ZERO || spent > Decimal::ZERO {
            by_category.push(CategoryBreakdown {
                category: category.clone(),
                monthly_limit: limit,
                spent,
                remaining: limit - spent,
                percent_used: percent_used(spent, limit),
            });
        }
    }

    let category_index: HashMap<Uuid, &CategoryInfo> =
        categories.iter().map(|c| (c.id, c)).collect();

    let recent_receipts = recent
        .into_iter()
        .map(|row| RecentReceipt {
            id: row.id,
            merchant_name: row.merchant_name,
            transaction_date: row.transaction_date,
            grand_total: row.grand_total,
            category: row
                .category_id
                .and_then(|id| category_index.get(&id))
                .map(|c| (*c).clone()),
            expense_type: row.expense_type,
            needs_review: row.confidence < confidence_threshold,
            created_at: row.created_at,
        })
        .collect();

    DashboardSummary {
        month: format!("{}-{:02}", period.year, period.month),
        total_budget,
        total_spent,
        total_remaining: total_budget - total_spent,
        by_category,
        recent_receipts,
    }
}

/// Percentage of the limit consumed, to one decimal place.
fn percent_used(spent: Decimal, limit: Decimal) -> Decimal {
    if limit > Decimal::ZERO {
        (spent / limit * Decimal::ONE_HUNDRED).round_dp(1)
    } else {
        Decimal::ZERO
    }
}
