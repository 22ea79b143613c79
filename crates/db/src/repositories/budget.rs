//! Budget repository: the temporal ledger of per-category limits.
//!
//! `set_budget` performs a read-repair-insert sequence that is not safe to
//! interleave: two concurrent calls for the same (household, category) can
//! otherwise both read the same predecessor records and produce duplicate
//! intervals. The whole sequence therefore runs inside one transaction
//! holding a Postgres advisory lock keyed by the pair.

use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, DbBackend, DbErr, EntityTrait, QueryFilter, Set, Statement,
    TransactionTrait,
};
use uuid::Uuid;

use recibo_core::budget::{
    BudgetError as CoreBudgetError, BudgetSpan, BudgetWindow, TargetPeriod,
    collect_active_limits, month_window, plan_repair,
};

use crate::entities::budgets;

/// Error types for budget ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum BudgetError {
    /// The target period is not a valid calendar month.
    #[error("invalid budget period: {year}-{month}")]
    InvalidPeriod {
        /// Requested year.
        year: i32,
        /// Requested month.
        month: u32,
    },

    /// Monthly limit cannot be negative.
    #[error("monthly limit cannot be negative")]
    NegativeLimit,

    /// Multiple records for one category cover the queried interval.
    #[error("overlapping budget records for category {category_id}")]
    Overlapping {
        /// Category with conflicting records.
        category_id: Uuid,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<CoreBudgetError> for BudgetError {
    fn from(err: CoreBudgetError) -> Self {
        match err {
            CoreBudgetError::InvalidPeriod { year, month } => Self::InvalidPeriod { year, month },
            CoreBudgetError::OverlappingBudgets { category_id } => {
                Self::Overlapping { category_id }
            }
        }
    }
}

/// Budget repository for ledger operations.
#[derive(Debug, Clone)]
pub struct BudgetRepository {
    db: DatabaseConnection,
}

impl BudgetRepository {
    /// Creates a new budget repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Sets the limit for a category, repairing overlapping records.
    ///
    /// With a target period the new record covers exactly that month; with
    /// none it covers `[now, unbounded)`. Existing records of the same
    /// (household, category) intersecting the new window are truncated
    /// (when they started earlier) or deleted (when fully superseded).
    /// Records outside the window are never touched.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::InvalidPeriod` for a bogus month,
    /// `BudgetError::NegativeLimit` for a negative amount, or a database
    /// error.
    pub async fn set_budget(
        &self,
        household_id: Uuid,
        category_id: Uuid,
        monthly_limit: Decimal,
        target: Option<TargetPeriod>,
    ) -> Result<budgets::Model, BudgetError> {
        if monthly_limit < Decimal::ZERO {
            return Err(BudgetError::NegativeLimit);
        }

        let window = match target {
            Some(period) => month_window(period)?,
            None => BudgetWindow::open_from(Utc::now()),
        };

        let txn = self.db.begin().await?;
        acquire_repair_lock(&txn, household_id, category_id).await?;

        let existing = Self::intersecting(&txn, household_id, category_id, &window).await?;

        let spans: Vec<BudgetSpan> = existing
            .iter()
            .map(|record| BudgetSpan {
                id: record.id,
                effective_from: record.effective_from.with_timezone(&Utc),
                effective_to: record.effective_to.map(|to| to.with_timezone(&Utc)),
            })
            .collect();

        let plan = plan_repair(&spans, &window);
        if !plan.is_empty() {
            tracing::debug!(
                truncated = plan.truncations.len(),
                deleted = plan.deletions.len(),
                %category_id,
                "Repairing overlapping budget records"
            );
        }

        for truncation in &plan.truncations {
            budgets::Entity::update_many()
                .col_expr(
                    budgets::Column::EffectiveTo,
                    Expr::value(truncation.new_effective_to),
                )
                .filter(budgets::Column::Id.eq(truncation.id))
                .exec(&txn)
                .await?;
        }

        if !plan.deletions.is_empty() {
            budgets::Entity::delete_many()
                .filter(budgets::Column::Id.is_in(plan.deletions.iter().copied()))
                .exec(&txn)
                .await?;
        }

        let record = budgets::ActiveModel {
            id: Set(Uuid::new_v4()),
            household_id: Set(household_id),
            category_id: Set(category_id),
            monthly_limit: Set(monthly_limit),
            effective_from: Set(window.start.into()),
            effective_to: Set(window.end.map(Into::into)),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(record)
    }

    /// The limit active per category during an interval.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::Overlapping` when more than one record for the
    /// same category intersects the interval — a broken invariant that must
    /// surface rather than be papered over by picking one.
    pub async fn active_budgets(
        &self,
        household_id: Uuid,
        window: &BudgetWindow,
    ) -> Result<HashMap<Uuid, Decimal>, BudgetError> {
        let mut query =
            budgets::Entity::find().filter(budgets::Column::HouseholdId.eq(household_id));
        query = Self::filter_intersecting(query, window);

        let records = query.all(&self.db).await?;

        Ok(collect_active_limits(
            records
                .into_iter()
                .map(|record| (record.category_id, record.monthly_limit)),
        )?)
    }

    /// Fetches records of one (household, category) intersecting a window,
    /// inside the repair transaction.
    async fn intersecting(
        txn: &DatabaseTransaction,
        household_id: Uuid,
        category_id: Uuid,
        window: &BudgetWindow,
    ) -> Result<Vec<budgets::Model>, DbErr> {
        let mut query = budgets::Entity::find()
            .filter(budgets::Column::HouseholdId.eq(household_id))
            .filter(budgets::Column::CategoryId.eq(category_id));
        query = Self::filter_intersecting(query, window);
        query.all(txn).await
    }

    /// Closed-interval intersection predicate:
    /// `from <= window.end AND (to IS NULL OR to >= window.start)`.
    fn filter_intersecting(
        mut query: sea_orm::Select<budgets::Entity>,
        window: &BudgetWindow,
    ) -> sea_orm::Select<budgets::Entity> {
        if let Some(end) = window.end {
            query = query.filter(budgets::Column::EffectiveFrom.lte(end));
        }
        query.filter(
            Condition::any()
                .add(budgets::Column::EffectiveTo.is_null())
                .add(budgets::Column::EffectiveTo.gte(window.start)),
        )
    }
}

/// Takes the advisory transaction lock guarding one (household, category)
/// repair sequence. Released automatically at commit or rollback.
async fn acquire_repair_lock(
    txn: &DatabaseTransaction,
    household_id: Uuid,
    category_id: Uuid,
) -> Result<(), DbErr> {
    let key = repair_lock_key(household_id, category_id);
    txn.execute(Statement::from_sql_and_values(
        DbBackend::Postgres,
        "SELECT pg_advisory_xact_lock($1)",
        [key.into()],
    ))
    .await?;
    Ok(())
}

/// Folds the (household, category) pair into the 64-bit key space Postgres
/// advisory locks use. `DefaultHasher` is SipHash with fixed keys, so the
/// mapping is stable across processes.
fn repair_lock_key(household_id: Uuid, category_id: Uuid) -> i64 {
    use std::hash::{DefaultHasher, Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    household_id.hash(&mut hasher);
    category_id.hash(&mut hasher);
    i64::from_ne_bytes(hasher.finish().to_ne_bytes())
}
