//! Tests for the budget ledger interval math.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal_macros::dec;
use uuid::Uuid;

use super::ledger::{
    collect_active_limits, month_window, plan_repair, span_intersects, truncation_step,
};
use super::types::{BudgetSpan, BudgetWindow, TargetPeriod};
use super::BudgetError;

fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

fn span(from: DateTime<Utc>, to: Option<DateTime<Utc>>) -> BudgetSpan {
    BudgetSpan {
        id: Uuid::new_v4(),
        effective_from: from,
        effective_to: to,
    }
}

/// Applies a plan to an in-memory record set, the way the repository does.
fn apply_plan(
    spans: &mut Vec<BudgetSpan>,
    window: &BudgetWindow,
) -> super::types::RepairPlan {
    let plan = plan_repair(spans, window);
    for truncation in &plan.truncations {
        if let Some(s) = spans.iter_mut().find(|s| s.id == truncation.id) {
            s.effective_to = Some(truncation.new_effective_to);
        }
    }
    spans.retain(|s| !plan.deletions.contains(&s.id));
    spans.push(span(window.start, window.end));
    plan
}

#[test]
fn test_month_window_is_closed_on_both_ends() {
    let window = month_window(TargetPeriod {
        year: 2024,
        month: 3,
    })
    .unwrap();

    assert_eq!(window.start, at(2024, 3, 1));
    // Last representable instant of March: one microsecond before April 1.
    assert_eq!(window.end, Some(at(2024, 4, 1) - truncation_step()));
}

#[test]
fn test_month_window_leap_february() {
    let window = month_window(TargetPeriod {
        year: 2024,
        month: 2,
    })
    .unwrap();

    assert_eq!(window.end, Some(at(2024, 3, 1) - truncation_step()));
    // 2024 is a leap year: the window must cover February 29.
    let leap_day = at(2024, 2, 29);
    assert!(window.start <= leap_day && leap_day <= window.end.unwrap());
}

#[test]
fn test_month_window_december_rolls_year() {
    let window = month_window(TargetPeriod {
        year: 2024,
        month: 12,
    })
    .unwrap();
    assert_eq!(window.end, Some(at(2025, 1, 1) - truncation_step()));
}

#[test]
fn test_month_window_rejects_invalid_month() {
    let result = month_window(TargetPeriod {
        year: 2024,
        month: 13,
    });
    assert!(matches!(result, Err(BudgetError::InvalidPeriod { .. })));
}

/// The worked overlap scenario: an open-ended record truncated by a
/// targeted month, leaving clean month-by-month answers.
#[test]
fn test_worked_overlap_scenario() {
    // Existing record A = [2024-01-01, open)
    let a = span(at(2024, 1, 1), None);
    let mut records = vec![a];

    // set_budget for March 2024.
    let march = month_window(TargetPeriod {
        year: 2024,
        month: 3,
    })
    .unwrap();
    let plan = apply_plan(&mut records, &march);

    // A survives, truncated to end just before March begins.
    assert_eq!(plan.truncations.len(), 1);
    assert_eq!(plan.deletions.len(), 0);
    assert_eq!(
        plan.truncations[0].new_effective_to,
        at(2024, 3, 1) - truncation_step()
    );
    assert_eq!(records.len(), 2);

    let active_in = |year: i32, month: u32| -> Vec<BudgetSpan> {
        let window = month_window(TargetPeriod { year, month }).unwrap();
        records
            .iter()
            .copied()
            .filter(|s| span_intersects(s, &window))
            .collect()
    };

    // February 2024 -> only A (the truncated predecessor).
    let feb = active_in(2024, 2);
    assert_eq!(feb.len(), 1);
    assert_eq!(feb[0].id, records[0].id);

    // March 2024 -> only B (the new record).
    let mar = active_in(2024, 3);
    assert_eq!(mar.len(), 1);
    assert_eq!(mar[0].effective_from, march.start);

    // April 2024 -> none: B is bounded and has no successor.
    assert!(active_in(2024, 4).is_empty());
}

/// Setting the same period twice leaves exactly one record for it.
#[test]
fn test_set_budget_is_idempotent_for_a_period() {
    let march = month_window(TargetPeriod {
        year: 2024,
        month: 3,
    })
    .unwrap();

    let mut records = Vec::new();
    apply_plan(&mut records, &march);
    assert_eq!(records.len(), 1);

    // Second call: the first record begins exactly at the window start,
    // so it is superseded and deleted, not truncated.
    let plan = apply_plan(&mut records, &march);
    assert_eq!(plan.deletions.len(), 1);
    assert!(plan.truncations.is_empty());
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].effective_from, march.start);
}

#[test]
fn test_open_window_supersedes_everything_after_now() {
    let now = at(2024, 6, 15);
    let window = BudgetWindow::open_from(now);

    let past = span(at(2024, 1, 1), Some(at(2024, 5, 31)));
    let running = span(at(2024, 1, 1), None);
    let future = span(at(2024, 8, 1), Some(at(2024, 8, 31)));

    let plan = plan_repair(&[past, running, future], &window);

    // The already-ended record does not intersect and is untouched.
    assert!(!plan.deletions.contains(&past.id));
    assert!(plan.truncations.iter().all(|t| t.id != past.id));

    // The running record survives, truncated.
    assert!(plan.truncations.iter().any(|t| t.id == running.id));

    // The future record is fully superseded.
    assert!(plan.deletions.contains(&future.id));
}

#[test]
fn test_repair_leaves_unrelated_intervals_alone() {
    // Two stale overlapping records both ending before the window: the
    // operation must not fix them.
    let stale_a = span(at(2023, 1, 1), Some(at(2023, 6, 30)));
    let stale_b = span(at(2023, 3, 1), Some(at(2023, 9, 30)));

    let window = month_window(TargetPeriod {
        year: 2024,
        month: 3,
    })
    .unwrap();

    let plan = plan_repair(&[stale_a, stale_b], &window);
    assert!(plan.is_empty());
}

#[test]
fn test_collect_active_limits_single_records() {
    let dining = Uuid::new_v4();
    let groceries = Uuid::new_v4();

    let limits =
        collect_active_limits([(dining, dec!(150)), (groceries, dec!(300))]).unwrap();

    assert_eq!(limits[&dining], dec!(150));
    assert_eq!(limits[&groceries], dec!(300));
}

#[test]
fn test_collect_active_limits_fails_loudly_on_overlap() {
    let dining = Uuid::new_v4();

    let result = collect_active_limits([(dining, dec!(150)), (dining, dec!(200))]);

    assert!(matches!(
        result,
        Err(BudgetError::OverlappingBudgets { category_id }) if category_id == dining
    ));
}

mod property_tests {
    use super::*;
    use proptest::prelude::*;

    prop_compose! {
        fn arb_span()(
            from_day in 0i64..720,
            len_days in proptest::option::of(0i64..360),
        ) -> BudgetSpan {
            let from = at(2023, 1, 1) + chrono::Duration::days(from_day);
            BudgetSpan {
                id: Uuid::new_v4(),
                effective_from: from,
                effective_to: len_days.map(|d| from + chrono::Duration::days(d)),
            }
        }
    }

    proptest! {
        // After applying a repair plan, no surviving old record intersects
        // the new window: the new record is the sole authority there.
        #[test]
        fn prop_repair_clears_the_window(
            spans in proptest::collection::vec(arb_span(), 0..8),
            year in 2023i32..2025,
            month in 1u32..=12,
        ) {
            let window = month_window(TargetPeriod { year, month }).unwrap();
            let plan = plan_repair(&spans, &window);

            let mut survivors: Vec<BudgetSpan> = Vec::new();
            for s in &spans {
                if plan.deletions.contains(&s.id) {
                    continue;
                }
                let mut s = *s;
                if let Some(t) = plan.truncations.iter().find(|t| t.id == s.id) {
                    s.effective_to = Some(t.new_effective_to);
                }
                survivors.push(s);
            }

            for s in &survivors {
                prop_assert!(
                    !span_intersects(s, &window),
                    "surviving span {:?} still intersects {:?}", s, window
                );
            }
        }

        // Truncation never deletes history before the window: a truncated
        // record still covers every instant it covered up to the window.
        #[test]
        fn prop_truncation_preserves_prefix(
            from_day in 0i64..59,
        ) {
            let from = at(2024, 1, 1) + chrono::Duration::days(from_day);
            let s = BudgetSpan {
                id: Uuid::new_v4(),
                effective_from: from,
                effective_to: None,
            };
            let window = month_window(TargetPeriod { year: 2024, month: 3 }).unwrap();

            let plan = plan_repair(&[s], &window);
            prop_assert_eq!(plan.truncations.len(), 1);
            let new_to = plan.truncations[0].new_effective_to;
            prop_assert!(new_to < window.start);
            prop_assert!(new_to >= s.effective_from);
        }
    }
}
