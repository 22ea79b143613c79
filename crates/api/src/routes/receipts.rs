//! Receipt routes: manual entry, image upload, listing, and edits.

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
};
use chrono::{DateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use super::{CategoryResponse, app_error, error_response, internal_error};
use crate::{AppState, middleware::AuthUser};
use recibo_core::budget::TargetPeriod;
use recibo_core::processor::{CategoryOption, ProcessError};
use recibo_core::storage::StorageError;
use recibo_shared::AppError;
use recibo_db::entities::{categories, receipts, sea_orm_active_enums::ExpenseType};
use recibo_db::repositories::category::CategoryRepository;
use recibo_db::repositories::receipt::{
    CreateReceiptInput, ReceiptError, ReceiptFilter, ReceiptRepository, UpdateReceiptInput,
};
use recibo_shared::types::ListQuery;

/// Creates the receipt routes (auth middleware applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/receipts/manual", post(create_manual_entry))
        .route("/receipts/upload", post(upload_receipt))
        .route("/receipts", get(list_receipts))
        .route("/receipts/{receipt_id}", get(get_receipt))
        .route("/receipts/{receipt_id}", patch(update_receipt))
        .route("/receipts/{receipt_id}", delete(delete_receipt))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for a manual expense entry.
#[derive(Debug, Deserialize)]
pub struct ManualEntryRequest {
    /// Merchant name.
    pub merchant_name: String,
    /// Grand total.
    pub grand_total: Decimal,
    /// Category to file the expense under.
    pub category_id: Uuid,
    /// Transaction date; defaults to now.
    pub transaction_date: Option<DateTime<Utc>>,
    /// Expense type tag.
    #[serde(default = "default_expense_type")]
    pub expense_type: ExpenseType,
}

fn default_expense_type() -> ExpenseType {
    ExpenseType::Personal
}

/// Request body for partially updating a receipt.
#[derive(Debug, Deserialize)]
pub struct ReceiptUpdateRequest {
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

/// Query parameters for listing receipts.
#[derive(Debug, Deserialize)]
pub struct ListReceiptsParams {
    /// Restrict to one category.
    pub category_id: Option<Uuid>,
    /// Filter year; only applied together with `month`.
    pub year: Option<i32>,
    /// Filter month; only applied together with `year`.
    pub month: Option<u32>,
    /// Page size (max 100).
    pub limit: Option<u64>,
    /// Page offset.
    pub offset: Option<u64>,
}

/// Receipt list item.
#[derive(Debug, Serialize)]
pub struct ReceiptListItem {
    /// Receipt ID.
    pub id: Uuid,
    /// Merchant name.
    pub merchant_name: Option<String>,
    /// Printed transaction date.
    pub transaction_date: Option<DateTime<Utc>>,
    /// Grand total.
    pub grand_total: Decimal,
    /// Assigned category.
    pub category: Option<CategoryResponse>,
    /// Expense type tag.
    pub expense_type: ExpenseType,
    /// True when confidence sits below the review threshold.
    pub needs_review: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Full receipt detail.
#[derive(Debug, Serialize)]
pub struct ReceiptDetail {
    /// Receipt ID.
    pub id: Uuid,
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
    /// Grand total.
    pub grand_total: Decimal,
    /// Payment method.
    pub payment_method: Option<String>,
    /// Assigned category.
    pub category: Option<CategoryResponse>,
    /// Categorization confidence.
    pub category_confidence: f64,
    /// True when a human chose the category.
    pub category_overridden: bool,
    /// Expense type tag.
    pub expense_type: ExpenseType,
    /// Serving URL of the stored image, if any.
    pub image_url: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Response for a processed upload.
#[derive(Debug, Serialize)]
pub struct ReceiptUploadResponse {
    /// Receipt ID.
    pub id: Uuid,
    /// Merchant name the model read.
    pub merchant_name: Option<String>,
    /// Transaction date the model read.
    pub transaction_date: Option<DateTime<Utc>>,
    /// Grand total.
    pub grand_total: Decimal,
    /// Assigned category.
    pub category: Option<CategoryResponse>,
    /// Categorization confidence.
    pub category_confidence: f64,
    /// True when the receipt should be confirmed by a human.
    pub needs_review: bool,
    /// Serving URL of the stored image.
    pub image_url: String,
}

// ============================================================================
// Helper Functions
// ============================================================================

fn receipt_detail(
    state: &AppState,
    receipt: receipts::Model,
    category: Option<categories::Model>,
) -> ReceiptDetail {
    ReceiptDetail {
        id: receipt.id,
        merchant_name: receipt.merchant_name,
        transaction_date: receipt.transaction_date.map(|d| d.with_timezone(&Utc)),
        subtotal: receipt.subtotal,
        tax: receipt.tax,
        tip: receipt.tip,
        grand_total: receipt.grand_total,
        payment_method: receipt.payment_method,
        category: category.map(CategoryResponse::from),
        category_confidence: receipt.category_confidence,
        category_overridden: receipt.category_overridden,
        expense_type: receipt.expense_type,
        image_url: receipt.image_key.as_deref().map(|k| state.storage.url_for(k)),
        created_at: receipt.created_at.with_timezone(&Utc),
    }
}

/// Builds the receipt row for a manual entry.
///
/// A human filed this expense, so the category is authoritative:
/// confidence is pinned to 1.0 and the receipt is marked overridden.
fn manual_entry_input(
    user_id: Uuid,
    household_id: Uuid,
    payload: ManualEntryRequest,
) -> CreateReceiptInput {
    CreateReceiptInput {
        user_id,
        household_id,
        image_key: None,
        merchant_name: Some(payload.merchant_name),
        transaction_date: Some(payload.transaction_date.unwrap_or_else(Utc::now)),
        subtotal: None,
        tax: None,
        tip: None,
        grand_total: payload.grand_total.round_dp(2),
        payment_method: None,
        category_id: Some(payload.category_id),
        category_confidence: 1.0,
        category_overridden: true,
        expense_type: payload.expense_type,
        raw_extraction: json!({}),
    }
}

/// Loads the category attached to a receipt, scoped to the household.
async fn load_category(
    state: &AppState,
    household_id: Uuid,
    category_id: Option<Uuid>,
) -> Result<Option<categories::Model>, Response> {
    let Some(category_id) = category_id else {
        return Ok(None);
    };

    let repo = CategoryRepository::new((*state.db).clone());
    repo.find_by_id(category_id, household_id)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to load category");
            internal_error()
        })
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/receipts/manual` - Record an expense without a receipt image.
///
/// Manual entries are human-categorized by definition: confidence is fixed
/// at 1.0 and the receipt is marked overridden.
async fn create_manual_entry(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<ManualEntryRequest>,
) -> impl IntoResponse {
    let cat_repo = CategoryRepository::new((*state.db).clone());

    let category = match cat_repo
        .find_by_id(payload.category_id, auth.household_id())
        .await
    {
        Ok(Some(category)) => category,
        Ok(None) => {
            return error_response(StatusCode::BAD_REQUEST, "invalid_category", "Invalid category");
        }
        Err(e) => {
            error!(error = %e, "Failed to look up category");
            return internal_error();
        }
    };

    let receipt_repo = ReceiptRepository::new((*state.db).clone());
    let input = manual_entry_input(auth.user_id(), auth.household_id(), payload);

    match receipt_repo.create(input).await {
        Ok(receipt) => {
            let detail = receipt_detail(&state, receipt, Some(category));
            (StatusCode::OK, Json(detail)).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to create manual entry");
            internal_error()
        }
    }
}

/// POST `/receipts/upload` - Upload a receipt image for processing.
///
/// Nothing is persisted unless the whole pipeline succeeds; a stored image
/// whose pipeline failed is deleted best-effort.
async fn upload_receipt(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> impl IntoResponse {
    // Pull the image out of the multipart body.
    let mut upload: Option<(String, String, Vec<u8>)> = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() == Some("file") {
                    let filename = field.file_name().unwrap_or("receipt.jpg").to_string();
                    let content_type = field.content_type().unwrap_or_default().to_string();
                    match field.bytes().await {
                        Ok(bytes) => {
                            upload = Some((filename, content_type, bytes.to_vec()));
                            break;
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to read upload body");
                            return error_response(
                                StatusCode::BAD_REQUEST,
                                "invalid_upload",
                                "Could not read the uploaded file",
                            );
                        }
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                error!(error = %e, "Malformed multipart body");
                return error_response(
                    StatusCode::BAD_REQUEST,
                    "invalid_upload",
                    "Malformed multipart body",
                );
            }
        }
    }

    let Some((filename, content_type, image_bytes)) = upload else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "missing_file",
            "A 'file' field is required",
        );
    };

    let size = u64::try_from(image_bytes.len()).unwrap_or(u64::MAX);
    if let Err(e) = state.storage.validate_upload(&content_type, size) {
        return match e {
            StorageError::InvalidMimeType { .. } => error_response(
                StatusCode::BAD_REQUEST,
                "invalid_file_type",
                "File must be JPEG, PNG, or WebP image",
            ),
            StorageError::FileTooLarge { max, .. } => error_response(
                StatusCode::BAD_REQUEST,
                "file_too_large",
                &format!("File too large. Max {max} bytes"),
            ),
            _ => internal_error(),
        };
    }

    // Active categories feed the categorization engine.
    let cat_repo = CategoryRepository::new((*state.db).clone());
    let categories = match cat_repo.list(auth.household_id(), false).await {
        Ok(categories) => categories,
        Err(e) => {
            error!(error = %e, "Failed to list categories");
            return internal_error();
        }
    };
    let options: Vec<CategoryOption> = categories
        .iter()
        .map(|c| CategoryOption {
            id: c.id,
            slug: c.slug.clone(),
        })
        .collect();

    // The image is written before the receipt row exists; on pipeline
    // failure the blob is removed again best-effort.
    let image_key = match state.storage.save(image_bytes.clone(), &filename).await {
        Ok(key) => key,
        Err(e) => {
            error!(error = %e, "Failed to store receipt image");
            return internal_error();
        }
    };

    let processed = match state
        .processor
        .process(&image_bytes, &content_type, &options)
        .await
    {
        Ok(processed) => processed,
        Err(e) => {
            error!(error = %e, "Receipt processing failed");
            // Nothing is persisted; the stored image goes away best-effort.
            let _ = state.storage.delete(&image_key).await;
            let err = match e {
                ProcessError::Extraction(inner) => AppError::Extraction(inner.to_string()),
                ProcessError::Classification(inner) => {
                    AppError::Classification(inner.to_string())
                }
            };
            return app_error(&err);
        }
    };

    let receipt_repo = ReceiptRepository::new((*state.db).clone());
    let input = CreateReceiptInput {
        user_id: auth.user_id(),
        household_id: auth.household_id(),
        image_key: Some(image_key.clone()),
        merchant_name: processed.receipt.merchant_name.clone(),
        transaction_date: processed
            .receipt
            .transaction_date
            .map(|d| d.and_time(NaiveTime::MIN).and_utc()),
        subtotal: processed.receipt.subtotal.map(|d| d.round_dp(2)),
        tax: processed.receipt.tax.map(|d| d.round_dp(2)),
        tip: processed.receipt.tip.map(|d| d.round_dp(2)),
        grand_total: processed.receipt.grand_total.round_dp(2),
        payment_method: processed.receipt.payment_method.clone(),
        category_id: processed.category_id,
        category_confidence: processed.confidence,
        category_overridden: false,
        expense_type: ExpenseType::Personal,
        raw_extraction: processed.raw.clone(),
    };

    let receipt = match receipt_repo.create(input).await {
        Ok(receipt) => receipt,
        Err(e) => {
            error!(error = %e, "Failed to persist receipt");
            let _ = state.storage.delete(&image_key).await;
            return internal_error();
        }
    };

    let category = receipt
        .category_id
        .and_then(|id| categories.iter().find(|c| c.id == id).cloned());
    let needs_review = receipt.category_confidence < state.confidence_threshold;

    let response = ReceiptUploadResponse {
        id: receipt.id,
        merchant_name: receipt.merchant_name,
        transaction_date: receipt.transaction_date.map(|d| d.with_timezone(&Utc)),
        grand_total: receipt.grand_total,
        category: category.map(CategoryResponse::from),
        category_confidence: receipt.category_confidence,
        needs_review,
        image_url: state.storage.url_for(&image_key),
    };

    (StatusCode::OK, Json(response)).into_response()
}

/// GET `/receipts` - List receipts with optional filtering.
async fn list_receipts(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<ListReceiptsParams>,
) -> impl IntoResponse {
    let period = match (params.year, params.month) {
        (Some(year), Some(month)) => Some(TargetPeriod { year, month }),
        _ => None,
    };

    let page = ListQuery {
        limit: params.limit.unwrap_or(50),
        offset: params.offset.unwrap_or(0),
    };

    let receipt_repo = ReceiptRepository::new((*state.db).clone());
    let receipts = match receipt_repo
        .list(
            auth.user_id(),
            ReceiptFilter {
                category_id: params.category_id,
                period,
            },
            page,
        )
        .await
    {
        Ok(receipts) => receipts,
        Err(ReceiptError::InvalidPeriod { year, month }) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "invalid_period",
                &format!("{year}-{month} is not a valid month"),
            );
        }
        Err(e) => {
            error!(error = %e, "Failed to list receipts");
            return internal_error();
        }
    };

    // Resolve categories for the page in one query.
    let category_ids: Vec<Uuid> = receipts.iter().filter_map(|r| r.category_id).collect();
    let cat_repo = CategoryRepository::new((*state.db).clone());
    let categories: HashMap<Uuid, categories::Model> = match cat_repo
        .find_by_ids(auth.household_id(), &category_ids)
        .await
    {
        Ok(categories) => categories.into_iter().map(|c| (c.id, c)).collect(),
        Err(e) => {
            error!(error = %e, "Failed to resolve categories");
            return internal_error();
        }
    };

    let items: Vec<ReceiptListItem> = receipts
        .into_iter()
        .map(|r| ReceiptListItem {
            id: r.id,
            merchant_name: r.merchant_name,
            transaction_date: r.transaction_date.map(|d| d.with_timezone(&Utc)),
            grand_total: r.grand_total,
            category: r
                .category_id
                .and_then(|id| categories.get(&id).cloned())
                .map(CategoryResponse::from),
            expense_type: r.expense_type,
            needs_review: r.category_confidence < state.confidence_threshold,
            created_at: r.created_at.with_timezone(&Utc),
        })
        .collect();

    (StatusCode::OK, Json(items)).into_response()
}

/// GET `/receipts/{receipt_id}` - Receipt detail.
async fn get_receipt(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(receipt_id): Path<Uuid>,
) -> impl IntoResponse {
    let receipt_repo = ReceiptRepository::new((*state.db).clone());

    let receipt = match receipt_repo.find_by_id(receipt_id, auth.user_id()).await {
        Ok(Some(receipt)) => receipt,
        Ok(None) => {
            return error_response(StatusCode::NOT_FOUND, "not_found", "Receipt not found");
        }
        Err(e) => {
            error!(error = %e, "Failed to load receipt");
            return internal_error();
        }
    };

    let category = match load_category(&state, auth.household_id(), receipt.category_id).await {
        Ok(category) => category,
        Err(response) => return response,
    };

    (StatusCode::OK, Json(receipt_detail(&state, receipt, category))).into_response()
}

/// PATCH `/receipts/{receipt_id}` - Update receipt fields.
///
/// Setting a category marks the receipt overridden: a human made the call.
async fn update_receipt(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(receipt_id): Path<Uuid>,
    Json(payload): Json<ReceiptUpdateRequest>,
) -> impl IntoResponse {
    // A category change must point at a category of the caller's household.
    if let Some(category_id) = payload.category_id {
        match load_category(&state, auth.household_id(), Some(category_id)).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    "invalid_category",
                    "Invalid category",
                );
            }
            Err(response) => return response,
        }
    }

    let receipt_repo = ReceiptRepository::new((*state.db).clone());
    let input = UpdateReceiptInput {
        category_id: payload.category_id,
        expense_type: payload.expense_type,
        merchant_name: payload.merchant_name,
        grand_total: payload.grand_total.map(|d| d.round_dp(2)),
        transaction_date: payload.transaction_date,
    };

    let receipt = match receipt_repo.update(receipt_id, auth.user_id(), input).await {
        Ok(receipt) => receipt,
        Err(ReceiptError::NotFound(_)) => {
            return error_response(StatusCode::NOT_FOUND, "not_found", "Receipt not found");
        }
        Err(e) => {
            error!(error = %e, "Failed to update receipt");
            return internal_error();
        }
    };

    let category = match load_category(&state, auth.household_id(), receipt.category_id).await {
        Ok(category) => category,
        Err(response) => return response,
    };

    (StatusCode::OK, Json(receipt_detail(&state, receipt, category))).into_response()
}

/// DELETE `/receipts/{receipt_id}` - Delete a receipt.
async fn delete_receipt(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(receipt_id): Path<Uuid>,
) -> impl IntoResponse {
    let receipt_repo = ReceiptRepository::new((*state.db).clone());

    match receipt_repo.delete(receipt_id, auth.user_id()).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "deleted": true }))).into_response(),
        Err(ReceiptError::NotFound(_)) => {
            error_response(StatusCode::NOT_FOUND, "not_found", "Receipt not found")
        }
        Err(e) => {
            error!(error = %e, "Failed to delete receipt");
            internal_error()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn payload(transaction_date: Option<DateTime<Utc>>) -> ManualEntryRequest {
        ManualEntryRequest {
            merchant_name: "Corner Bakery".to_string(),
            grand_total: Decimal::from_str("12.345").unwrap(),
            category_id: Uuid::new_v4(),
            transaction_date,
            expense_type: ExpenseType::Household,
        }
    }

    #[test]
    fn test_manual_entry_is_always_overridden_at_full_confidence() {
        let input = manual_entry_input(Uuid::new_v4(), Uuid::new_v4(), payload(None));

        assert!(input.category_overridden);
        assert!(input.category_confidence >= 1.0);
        assert!(input.category_confidence <= 1.0);
        assert!(input.image_key.is_none());
        assert_eq!(input.expense_type, ExpenseType::Household);
    }

    #[test]
    fn test_manual_entry_rounds_money_and_keeps_given_date() {
        let date = Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap();
        let input = manual_entry_input(Uuid::new_v4(), Uuid::new_v4(), payload(Some(date)));

        assert_eq!(input.grand_total, Decimal::from_str("12.34").unwrap());
        assert_eq!(input.transaction_date, Some(date));
    }

    #[test]
    fn test_manual_entry_defaults_date_to_now() {
        let before = Utc::now();
        let input = manual_entry_input(Uuid::new_v4(), Uuid::new_v4(), payload(None));
        let after = Utc::now();

        let date = input.transaction_date.expect("date defaults to now");
        assert!(date >= before && date <= after);
    }
}
