//! Receipt repository for receipt persistence and spending queries.
//!
//! Every time-windowed query here works off the receipt's *effective date*:
//! the printed transaction date when extraction found one, the creation
//! timestamp otherwise.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, FromQueryResult,
    ModelTrait, Order, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde_json::Value;
use uuid::Uuid;

use recibo_core::budget::{BudgetError as CoreBudgetError, BudgetWindow, TargetPeriod, month_window};
use recibo_shared::types::ListQuery;

use crate::entities::{receipts, sea_orm_active_enums::ExpenseType};

/// How many receipts the dashboard's recent list carries.
pub const RECENT_LIMIT: u64 = 10;

/// Error types for receipt operations.
#[derive(Debug, thiserror::Error)]
pub enum ReceiptError {
    /// Receipt not found (or not owned by the caller).
    #[error("Receipt not found: {0}")]
    NotFound(Uuid),

    /// The year/month filter is not a real calendar month.
    #[error("invalid period: {year}-{month}")]
    InvalidPeriod {
        /// Requested year.
        year: i32,
        /// Requested month.
        month: u32,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a receipt.
#[derive(Debug, Clone)]
pub struct CreateReceiptInput {
    /// Owning user.
    pub user_id: Uuid,
    /// Household scope.
    pub household_id: Uuid,
    /// Stored image key; `None` for manual entries.
    pub image_key: Option<String>,
    /// Merchant name.
    pub merchant_name: Option<String>,
    /// Printed transaction date.
    pub transaction_date: Option<DateTime<Utc>>,
    /// Pre-tax subtotal.
    pub subtotal: Option<Decimal>,
    /// Tax amount.
    pub tax: Option<Decimal>,
    /// Tip amount.
    pub tip: Option<Decimal>,
    /// Grand total; always present.
    pub grand_total: Decimal,
    /// Payment method.
    pub payment_method: Option<String>,
    /// Assigned category.
    pub category_id: Option<Uuid>,
    /// Categorization confidence in [0, 1].
    pub category_confidence: f64,
    /// True when a human chose the category.
    pub category_overridden: bool,
    /// Expense type tag.
    pub expense_type: ExpenseType,
    /// Raw extraction payload for audit.
    pub raw_extraction: Value,
}

/// Input for partially updating a receipt.
#[derive(Debug, Clone, Default)]
pub struct UpdateReceiptInput {
    /// New category; setting this marks the receipt overridden.
    pub category_id: Option<Uuid>,
    /// New expense type.
    pub expense_type: Option<ExpenseType>,
    /// New merchant name.
    pub merchant_name: Option<String>,
    /// New grand total.
    pub grand_total: Option<Decimal>,
    /// New transaction date.
    pub transaction_date: Option<DateTime<Utc>>,
}

/// Filters for the receipt list endpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReceiptFilter {
    /// Restrict to one category.
    pub category_id: Option<Uuid>,
    /// Restrict to one calendar month (by effective date).
    pub period: Option<TargetPeriod>,
}

#[derive(FromQueryResult)]
struct SpendRow {
    category_id: Uuid,
    total: Decimal,
}

/// `COALESCE(transaction_date, created_at)` — the effective date.
fn effective_date() -> SimpleExpr {
    Func::coalesce([
        Expr::col(receipts::Column::TransactionDate).into(),
        Expr::col(receipts::Column::CreatedAt).into(),
    ])
    .into()
}

/// Receipt repository for CRUD and aggregation queries.
#[derive(Debug, Clone)]
pub struct ReceiptRepository {
    db: DatabaseConnection,
}

impl ReceiptRepository {
    /// Creates a new receipt repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a receipt.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create(&self, input: CreateReceiptInput) -> Result<receipts::Model, ReceiptError> {
        let receipt = receipts::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(input.user_id),
            household_id: Set(input.household_id),
            image_key: Set(input.image_key),
            merchant_name: Set(input.merchant_name),
            transaction_date: Set(input.transaction_date.map(Into::into)),
            subtotal: Set(input.subtotal),
            tax: Set(input.tax),
            tip: Set(input.tip),
            grand_total: Set(input.grand_total),
            payment_method: Set(input.payment_method),
            category_id: Set(input.category_id),
            category_confidence: Set(input.category_confidence),
            category_overridden: Set(input.category_overridden),
            expense_type: Set(input.expense_type),
            raw_extraction: Set(input.raw_extraction),
            created_at: Set(Utc::now().into()),
        };

        Ok(receipt.insert(&self.db).await?)
    }

    /// Finds a receipt by ID, scoped to its owner.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<receipts::Model>, ReceiptError> {
        Ok(receipts::Entity::find_by_id(id)
            .filter(receipts::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?)
    }

    /// Lists a user's receipts, newest effective date first.
    ///
    /// # Errors
    ///
    /// Returns `ReceiptError::InvalidPeriod` for a bogus month filter.
    pub async fn list(
        &self,
        user_id: Uuid,
        filter: ReceiptFilter,
        page: ListQuery,
    ) -> Result<Vec<receipts::Model>, ReceiptError> {
        let mut query = receipts::Entity::find().filter(receipts::Column::UserId.eq(user_id));

        if let Some(category_id) = filter.category_id {
            query = query.filter(receipts::Column::CategoryId.eq(category_id));
        }

        if let Some(period) = filter.period {
            let window = month_window(period).map_err(invalid_period)?;
            query = Self::filter_window(query, &window);
        }

        Ok(query
            .order_by(effective_date(), Order::Desc)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?)
    }

    /// The most recent receipts within a window, newest effective date
    /// first, capped at [`RECENT_LIMIT`].
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn recent_in_window(
        &self,
        user_id: Uuid,
        window: &BudgetWindow,
    ) -> Result<Vec<receipts::Model>, ReceiptError> {
        let query = Self::filter_window(
            receipts::Entity::find().filter(receipts::Column::UserId.eq(user_id)),
            window,
        );

        Ok(query
            .order_by(effective_date(), Order::Desc)
            .limit(RECENT_LIMIT)
            .all(&self.db)
            .await?)
    }

    /// Sums grand totals per category for receipts whose effective date
    /// falls inside the window. Categoryless receipts are excluded.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn spend_by_category(
        &self,
        user_id: Uuid,
        window: &BudgetWindow,
    ) -> Result<Vec<(Uuid, Decimal)>, ReceiptError> {
        let query = Self::filter_window(
            receipts::Entity::find()
                .select_only()
                .column(receipts::Column::CategoryId)
                .column_as(receipts::Column::GrandTotal.sum(), "total")
                .filter(receipts::Column::UserId.eq(user_id))
                .filter(receipts::Column::CategoryId.is_not_null()),
            window,
        );

        let rows = query
            .group_by(receipts::Column::CategoryId)
            .into_model::<SpendRow>()
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().map(|r| (r.category_id, r.total)).collect())
    }

    /// Applies partial updates; setting a category marks the receipt
    /// overridden.
    ///
    /// # Errors
    ///
    /// Returns `ReceiptError::NotFound` when the receipt is absent or not
    /// owned by the caller.
    pub async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        input: UpdateReceiptInput,
    ) -> Result<receipts::Model, ReceiptError> {
        let existing = self
            .find_by_id(id, user_id)
            .await?
            .ok_or(ReceiptError::NotFound(id))?;

        let mut receipt: receipts::ActiveModel = existing.into();
        if let Some(category_id) = input.category_id {
            receipt.category_id = Set(Some(category_id));
            receipt.category_overridden = Set(true);
        }
        if let Some(expense_type) = input.expense_type {
            receipt.expense_type = Set(expense_type);
        }
        if let Some(merchant_name) = input.merchant_name {
            receipt.merchant_name = Set(Some(merchant_name));
        }
        if let Some(grand_total) = input.grand_total {
            receipt.grand_total = Set(grand_total);
        }
        if let Some(transaction_date) = input.transaction_date {
            receipt.transaction_date = Set(Some(transaction_date.into()));
        }

        Ok(receipt.update(&self.db).await?)
    }

    /// Deletes a receipt.
    ///
    /// # Errors
    ///
    /// Returns `ReceiptError::NotFound` when the receipt is absent or not
    /// owned by the caller.
    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<(), ReceiptError> {
        let existing = self
            .find_by_id(id, user_id)
            .await?
            .ok_or(ReceiptError::NotFound(id))?;

        existing.delete(&self.db).await?;
        Ok(())
    }

    /// Constrains a query to effective dates inside a closed window.
    fn filter_window<Q: QueryFilter>(query: Q, window: &BudgetWindow) -> Q {
        let mut query = query.filter(Expr::expr(effective_date()).gte(window.start));
        if let Some(end) = window.end {
            query = query.filter(Expr::expr(effective_date()).lte(end));
        }
        query
    }
}

fn invalid_period(err: CoreBudgetError) -> ReceiptError {
    match err {
        CoreBudgetError::InvalidPeriod { year, month } => ReceiptError::InvalidPeriod { year, month },
        // plan/overlap errors cannot come out of month_window
        CoreBudgetError::OverlappingBudgets { category_id } => {
            ReceiptError::Database(DbErr::Custom(format!(
                "unexpected overlap error for {category_id}"
            )))
        }
    }
}
