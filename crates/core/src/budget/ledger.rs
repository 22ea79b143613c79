//! Interval math for the budget ledger.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::error::BudgetError;
use super::types::{BudgetSpan, BudgetWindow, RepairPlan, TargetPeriod, Truncation};

/// The smallest representable step between two distinct timestamps.
///
/// Postgres `timestamptz` has microsecond precision; a truncated
/// predecessor ends exactly one step before the new window starts, so the
/// two closed intervals share no instant.
#[must_use]
pub fn truncation_step() -> Duration {
    Duration::microseconds(1)
}

/// Computes the closed window covering one calendar month.
///
/// The window runs from the month's first instant to its last representable
/// instant (one microsecond before the next month begins).
///
/// # Errors
///
/// Returns `BudgetError::InvalidPeriod` when the year/month pair is not a
/// real calendar month.
pub fn month_window(period: TargetPeriod) -> Result<BudgetWindow, BudgetError> {
    let TargetPeriod { year, month } = period;

    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or(BudgetError::InvalidPeriod {
        year,
        month,
    })?;

    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let next_first =
        NaiveDate::from_ymd_opt(next_year, next_month, 1).ok_or(BudgetError::InvalidPeriod {
            year,
            month,
        })?;

    let start = Utc.from_utc_datetime(&first.and_time(NaiveTime::MIN));
    let end = Utc.from_utc_datetime(&next_first.and_time(NaiveTime::MIN)) - truncation_step();

    Ok(BudgetWindow {
        start,
        end: Some(end),
    })
}

/// Closed-interval intersection between a stored span and a window.
#[must_use]
pub fn span_intersects(span: &BudgetSpan, window: &BudgetWindow) -> bool {
    let starts_in_time = match window.end {
        Some(end) => span.effective_from <= end,
        None => true,
    };
    let still_active = match span.effective_to {
        Some(to) => to >= window.start,
        None => true,
    };
    starts_in_time && still_active
}

/// Plans the repair `set_budget` performs on records that intersect the new
/// window.
///
/// A record that began before the window survives, truncated to end one
/// [`truncation_step`] before the window starts. A record that begins at or
/// after the window start is fully superseded and deleted. Records that do
/// not intersect the window are left alone — the operation never repairs
/// unrelated overlaps elsewhere in the category's history.
#[must_use]
pub fn plan_repair(existing: &[BudgetSpan], window: &BudgetWindow) -> RepairPlan {
    let mut plan = RepairPlan::default();

    for span in existing {
        if !span_intersects(span, window) {
            continue;
        }

        if span.effective_from < window.start {
            plan.truncations.push(Truncation {
                id: span.id,
                new_effective_to: window.start - truncation_step(),
            });
        } else {
            plan.deletions.push(span.id);
        }
    }

    plan
}

/// Folds `(category_id, limit)` pairs from records intersecting a query
/// interval into a per-category map.
///
/// # Errors
///
/// Returns `BudgetError::OverlappingBudgets` when two records claim the
/// same category: the intended invariant (one record per category per
/// instant) is broken and silently picking a winner would hide it.
pub fn collect_active_limits(
    records: impl IntoIterator<Item = (Uuid, Decimal)>,
) -> Result<HashMap<Uuid, Decimal>, BudgetError> {
    let mut limits = HashMap::new();

    for (category_id, limit) in records {
        if limits.insert(category_id, limit).is_some() {
            return Err(BudgetError::OverlappingBudgets { category_id });
        }
    }

    Ok(limits)
}
