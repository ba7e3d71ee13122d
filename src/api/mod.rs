pub mod admin;
pub mod artisan;
pub mod public;
pub mod user;

use axum::{http::StatusCode, middleware, response::Response, Extension, Json, Router};
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{DatabaseConnection, DbErr};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use validator::ValidationErrors;

use crate::cart::{CartError, CartService};
use crate::config::AppConfig;
use crate::entities::user::Role;
use crate::middleware::auth::AuthState;
use crate::middleware::logging::{logging_middleware, to_response, ApiError};
use admin::admin_api_router;
use artisan::artisan_api_router;
use public::public_api_router;
use user::user_api_router;

pub const PAGE_SIZE: u64 = 12;

pub(crate) static PHONE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9 ()-]{7,20}$").expect("valid regex"));

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<AppConfig>,
    pub cart: Arc<CartService>,
}

impl AppState {
    pub(crate) fn auth(&self, role: Option<Role>) -> AuthState {
        AuthState {
            db: self.db.clone(),
            config: self.config.clone(),
            role,
        }
    }
}

pub fn create_api_router(state: AppState) -> Router {
    Router::new()
        .merge(public::auth::auth_router())
        .nest("/api", public_api_router().merge(user_api_router(&state)))
        .nest("/api/artisan", artisan_api_router(&state))
        .nest("/api/admin", admin_api_router(&state))
        .layer(Extension(state.db.clone()))
        .layer(Extension(state.config.clone()))
        .layer(Extension(state.cart.clone()))
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
}

pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let message = message.into();
    to_response(
        (status, Json(json!({ "error": message.clone() }))),
        Err(ApiError::General(message)),
    )
}

pub(crate) fn db_error_response(err: DbErr) -> Response {
    to_response(
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Internal server error"
            })),
        ),
        Err(ApiError::DbError(err.to_string())),
    )
}

pub(crate) fn validation_response(errors: ValidationErrors) -> Response {
    to_response(
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": "Invalid payload",
                "details": errors.to_string()
            })),
        ),
        Err(ApiError::ValidationFail(errors.to_string())),
    )
}

pub(crate) fn cart_error_response(err: CartError) -> Response {
    let status = match &err {
        CartError::NotFound(_) => StatusCode::NOT_FOUND,
        CartError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
        CartError::AuthorizationError { .. } => StatusCode::FORBIDDEN,
        CartError::EmptyCart | CartError::InsufficientStock { .. } => StatusCode::CONFLICT,
        CartError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = match &err {
        CartError::Database(_) => json!({ "error": "Internal server error" }),
        CartError::AuthenticationRequired => json!({
            "error": err.to_string(),
            "login": "/login"
        }),
        CartError::InsufficientStock {
            product_id,
            requested,
            available,
        } => json!({
            "error": err.to_string(),
            "product_id": product_id,
            "requested": requested,
            "available": available
        }),
        _ => json!({ "error": err.to_string() }),
    };
    to_response((status, Json(body)), Err(ApiError::from(&err)))
}
