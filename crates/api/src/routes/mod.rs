//! API route definitions.

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::{AppState, middleware::auth::auth_middleware};

pub mod budget;
pub mod categories;
pub mod health;
pub mod receipts;

/// Creates the API router with all routes.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Protected routes that require authentication
    let protected_routes = Router::new()
        .merge(receipts::routes())
        .merge(budget::routes())
        .merge(categories::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Combine public and protected routes
    Router::new().merge(health::routes()).merge(protected_routes)
}

/// Category payload reused by every route group.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryResponse {
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

impl From<recibo_db::entities::categories::Model> for CategoryResponse {
    fn from(cat: recibo_db::entities::categories::Model) -> Self {
        Self {
            id: cat.id,
            name: cat.name,
            slug: cat.slug,
            icon: cat.icon,
            is_active: cat.is_active,
            sort_order: cat.sort_order,
        }
    }
}

/// Builds the standard error body used across all handlers.
pub(crate) fn error_response(status: StatusCode, error: &str, message: &str) -> Response {
    (
        status,
        Json(json!({ "error": error, "message": message })),
    )
        .into_response()
}

/// Renders a shared [`AppError`] with its canonical status and error code.
pub(crate) fn app_error(err: &recibo_shared::AppError) -> Response {
    let status = StatusCode::from_u16(err.status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    error_response(status, err.error_code(), &err.to_string())
}

/// The catch-all 500 response.
pub(crate) fn internal_error() -> Response {
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "An error occurred",
    )
}
