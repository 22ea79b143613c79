//! Budget ledger data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A calendar month a budget limit is targeted at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetPeriod {
    /// Calendar year.
    pub year: i32,
    /// Calendar month, 1-12.
    pub month: u32,
}

/// The closed interval a budget operation applies to.
///
/// `end = None` means unbounded into the future.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetWindow {
    /// First covered instant (inclusive).
    pub start: DateTime<Utc>,
    /// Last covered instant (inclusive); `None` for open-ended.
    pub end: Option<DateTime<Utc>>,
}

impl BudgetWindow {
    /// An open-ended window starting at `start`.
    #[must_use]
    pub const fn open_from(start: DateTime<Utc>) -> Self {
        Self { start, end: None }
    }
}

/// The interval of one stored budget record, as seen by the repair planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetSpan {
    /// Record ID.
    pub id: Uuid,
    /// First covered instant (inclusive).
    pub effective_from: DateTime<Utc>,
    /// Last covered instant (inclusive); `None` for open-ended.
    pub effective_to: Option<DateTime<Utc>>,
}

/// Truncation of a surviving predecessor record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Truncation {
    /// Record to truncate.
    pub id: Uuid,
    /// Its new inclusive end.
    pub new_effective_to: DateTime<Utc>,
}

/// What `set_budget` must do to the existing records before inserting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairPlan {
    /// Records that survive, bounded to end just before the new window.
    pub truncations: Vec<Truncation>,
    /// Records fully superseded by the new window.
    pub deletions: Vec<Uuid>,
}

impl RepairPlan {
    /// True when no existing record is affected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.truncations.is_empty() && self.deletions.is_empty()
    }
}
