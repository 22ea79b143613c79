//! Budget routes: the monthly dashboard and the set-budget operation.

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};
use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use super::{CategoryResponse, error_response, internal_error};
use crate::{AppState, middleware::AuthUser};
use recibo_core::budget::{TargetPeriod, month_window};
use recibo_core::dashboard::{CategoryInfo, ExpenseType, RecentReceiptRow, build_summary};
use recibo_db::entities::{categories, receipts, sea_orm_active_enums};
use recibo_db::repositories::budget::{BudgetError, BudgetRepository};
use recibo_db::repositories::category::CategoryRepository;
use recibo_db::repositories::receipt::ReceiptRepository;

/// Creates the budget routes (auth middleware applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/budget", get(get_budget_dashboard))
        .route("/budget/categories/{category_id}", put(set_category_budget))
}

/// Query parameters for the dashboard.
#[derive(Debug, Deserialize)]
pub struct DashboardParams {
    /// Reporting year; defaults to the current UTC year.
    pub year: Option<i32>,
    /// Reporting month; defaults to the current UTC month.
    pub month: Option<u32>,
}

/// Request body for setting a category budget.
#[derive(Debug, Deserialize)]
pub struct BudgetSetRequest {
    /// Monthly limit.
    pub monthly_limit: Decimal,
    /// Target year; together with `month` pins the limit to one month.
    pub year: Option<i32>,
    /// Target month.
    pub month: Option<u32>,
}

fn category_info(cat: &categories::Model) -> CategoryInfo {
    CategoryInfo {
        id: cat.id,
        name: cat.name.clone(),
        slug: cat.slug.clone(),
        icon: cat.icon.clone(),
        is_active: cat.is_active,
        sort_order: cat.sort_order,
    }
}

const fn expense_type(value: &sea_orm_active_enums::ExpenseType) -> ExpenseType {
    match value {
        sea_orm_active_enums::ExpenseType::Personal => ExpenseType::Personal,
        sea_orm_active_enums::ExpenseType::Household => ExpenseType::Household,
    }
}

fn recent_row(receipt: receipts::Model) -> RecentReceiptRow {
    RecentReceiptRow {
        id: receipt.id,
        merchant_name: receipt.merchant_name,
        transaction_date: receipt.transaction_date.map(|d| d.with_timezone(&Utc)),
        grand_total: receipt.grand_total,
        category_id: receipt.category_id,
        expense_type: expense_type(&receipt.expense_type),
        confidence: receipt.category_confidence,
        created_at: receipt.created_at.with_timezone(&Utc),
    }
}

/// GET `/budget` - Budget overview for a month, default the current one.
async fn get_budget_dashboard(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<DashboardParams>,
) -> impl IntoResponse {
    let now = Utc::now();
    let period = TargetPeriod {
        year: params.year.unwrap_or_else(|| now.year()),
        month: params.month.unwrap_or_else(|| now.month()),
    };

    let window = match month_window(period) {
        Ok(window) => window,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, "invalid_period", &e.to_string());
        }
    };

    let cat_repo = CategoryRepository::new((*state.db).clone());
    let categories = match cat_repo.list(auth.household_id(), false).await {
        Ok(categories) => categories,
        Err(e) => {
            error!(error = %e, "Failed to list categories");
            return internal_error();
        }
    };

    let budget_repo = BudgetRepository::new((*state.db).clone());
    let limits = match budget_repo.active_budgets(auth.household_id(), &window).await {
        Ok(limits) => limits,
        Err(BudgetError::Overlapping { category_id }) => {
            // Broken ledger invariant; refuse to guess which limit applies.
            error!(%category_id, "Overlapping budget records detected");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "overlapping_budgets",
                "Conflicting budget records for a category; the ledger needs repair",
            );
        }
        Err(e) => {
            error!(error = %e, "Failed to load budgets");
            return internal_error();
        }
    };

    let receipt_repo = ReceiptRepository::new((*state.db).clone());
    let spent: HashMap<Uuid, Decimal> = match receipt_repo
        .spend_by_category(auth.user_id(), &window)
        .await
    {
        Ok(rows) => rows.into_iter().collect(),
        Err(e) => {
            error!(error = %e, "Failed to sum spending");
            return internal_error();
        }
    };

    let recent = match receipt_repo.recent_in_window(auth.user_id(), &window).await {
        Ok(receipts) => receipts.into_iter().map(recent_row).collect(),
        Err(e) => {
            error!(error = %e, "Failed to load recent receipts");
            return internal_error();
        }
    };

    let infos: Vec<CategoryInfo> = categories.iter().map(category_info).collect();
    let summary = build_summary(
        period,
        &infos,
        &spent,
        &limits,
        recent,
        state.confidence_threshold,
    );

    (StatusCode::OK, Json(summary)).into_response()
}

/// PUT `/budget/categories/{category_id}` - Set a category's monthly limit.
async fn set_category_budget(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(category_id): Path<Uuid>,
    Json(payload): Json<BudgetSetRequest>,
) -> impl IntoResponse {
    let cat_repo = CategoryRepository::new((*state.db).clone());
    let category = match cat_repo.find_by_id(category_id, auth.household_id()).await {
        Ok(Some(category)) => category,
        Ok(None) => {
            return error_response(StatusCode::NOT_FOUND, "not_found", "Category not found");
        }
        Err(e) => {
            error!(error = %e, "Failed to look up category");
            return internal_error();
        }
    };

    let target = match (payload.year, payload.month) {
        (Some(year), Some(month)) => Some(TargetPeriod { year, month }),
        _ => None,
    };

    let budget_repo = BudgetRepository::new((*state.db).clone());
    match budget_repo
        .set_budget(
            auth.household_id(),
            category_id,
            payload.monthly_limit.round_dp(2),
            target,
        )
        .await
    {
        Ok(record) => (
            StatusCode::OK,
            Json(json!({
                "category": CategoryResponse::from(category),
                "monthly_limit": record.monthly_limit,
            })),
        )
            .into_response(),
        Err(BudgetError::InvalidPeriod { year, month }) => error_response(
            StatusCode::BAD_REQUEST,
            "invalid_period",
            &format!("{year}-{month} is not a valid month"),
        ),
        Err(BudgetError::NegativeLimit) => error_response(
            StatusCode::BAD_REQUEST,
            "negative_limit",
            "Monthly limit cannot be negative",
        ),
        Err(e) => {
            error!(error = %e, "Failed to set budget");
            internal_error()
        }
    }
}
