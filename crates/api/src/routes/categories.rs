//! Category management routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, patch, post},
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use super::{CategoryResponse, error_response, internal_error};
use crate::{AppState, middleware::AuthUser};
use recibo_db::repositories::category::{
    CategoryError, CategoryRepository, CreateCategoryInput, UpdateCategoryInput,
};

/// Creates the category routes (auth middleware applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories))
        .route("/categories", post(create_category))
        .route("/categories/{category_id}", patch(update_category))
        .route("/categories/{category_id}", delete(delete_category))
}

/// Query parameters for listing categories.
#[derive(Debug, Deserialize)]
pub struct ListCategoriesParams {
    /// Include soft-deleted categories.
    #[serde(default)]
    pub include_inactive: bool,
}

/// Request body for creating a category.
#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    /// Display name.
    pub name: String,
    /// Unique-per-household slug.
    pub slug: String,
    /// Optional icon.
    pub icon: Option<String>,
    /// UI ordering.
    #[serde(default)]
    pub sort_order: i32,
}

/// Request body for updating a category.
#[derive(Debug, Deserialize)]
pub struct UpdateCategoryRequest {
    /// New display name.
    pub name: Option<String>,
    /// New slug.
    pub slug: Option<String>,
    /// New icon.
    pub icon: Option<String>,
    /// New active flag.
    pub is_active: Option<bool>,
    /// New sort order.
    pub sort_order: Option<i32>,
}

/// GET `/categories` - List the household's categories.
async fn list_categories(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<ListCategoriesParams>,
) -> impl IntoResponse {
    let repo = CategoryRepository::new((*state.db).clone());

    match repo
        .list(auth.household_id(), params.include_inactive)
        .await
    {
        Ok(categories) => {
            let response: Vec<CategoryResponse> =
                categories.into_iter().map(CategoryResponse::from).collect();
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list categories");
            internal_error()
        }
    }
}

/// POST `/categories` - Create a new category.
async fn create_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateCategoryRequest>,
) -> impl IntoResponse {
    let repo = CategoryRepository::new((*state.db).clone());

    let input = CreateCategoryInput {
        household_id: auth.household_id(),
        name: payload.name,
        slug: payload.slug,
        icon: payload.icon,
        sort_order: payload.sort_order,
    };

    match repo.create(input).await {
        Ok(category) => {
            (StatusCode::OK, Json(CategoryResponse::from(category))).into_response()
        }
        Err(CategoryError::DuplicateSlug(slug)) => error_response(
            StatusCode::BAD_REQUEST,
            "duplicate_slug",
            &format!("Category with slug '{slug}' already exists"),
        ),
        Err(e) => {
            error!(error = %e, "Failed to create category");
            internal_error()
        }
    }
}

/// PATCH `/categories/{category_id}` - Update a category.
async fn update_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(category_id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> impl IntoResponse {
    let repo = CategoryRepository::new((*state.db).clone());

    let input = UpdateCategoryInput {
        name: payload.name,
        slug: payload.slug,
        icon: payload.icon,
        is_active: payload.is_active,
        sort_order: payload.sort_order,
    };

    match repo.update(category_id, auth.household_id(), input).await {
        Ok(category) => {
            (StatusCode::OK, Json(CategoryResponse::from(category))).into_response()
        }
        Err(CategoryError::NotFound(_)) => error_response(
            StatusCode::NOT_FOUND,
            "not_found",
            "Category not found",
        ),
        Err(CategoryError::DuplicateSlug(slug)) => error_response(
            StatusCode::BAD_REQUEST,
            "duplicate_slug",
            &format!("Category with slug '{slug}' already exists"),
        ),
        Err(e) => {
            error!(error = %e, "Failed to update category");
            internal_error()
        }
    }
}

/// DELETE `/categories/{category_id}` - Soft-delete a category.
async fn delete_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(category_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = CategoryRepository::new((*state.db).clone());

    match repo.soft_delete(category_id, auth.household_id()).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "deleted": true }))).into_response(),
        Err(CategoryError::NotFound(_)) => error_response(
            StatusCode::NOT_FOUND,
            "not_found",
            "Category not found",
        ),
        Err(e) => {
            error!(error = %e, "Failed to delete category");
            internal_error()
        }
    }
}
