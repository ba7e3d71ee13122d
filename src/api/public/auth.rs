use axum::{
    extract::Extension,
    http::StatusCode,
    response::Response,
    routing::post,
    Json, Router,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set, TransactionTrait,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use validator::{Validate, ValidationError};

use crate::api::{db_error_response, error_response, validation_response, PHONE_REGEX};
use crate::config::AppConfig;
use crate::entities::{
    artisan, customer, hash_password,
    user::{self, Entity as UserEntity, Role},
};
use crate::middleware::auth::generate_token;
use crate::middleware::logging::{to_response, ApiError};

pub fn auth_router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

async fn register(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(config): Extension<Arc<AppConfig>>,
    Json(payload): Json<RegisterPayload>,
) -> Response {
    if let Err(errors) = payload.validate() {
        return validation_response(errors);
    }

    let email = payload.email.trim().to_lowercase();
    match UserEntity::find()
        .filter(user::Column::Username.eq(&*email))
        .count(&*db)
        .await
    {
        Ok(0) => {}
        Ok(_) => return error_response(StatusCode::CONFLICT, "Email is already registered"),
        Err(err) => return db_error_response(err),
    }

    let password = match hash_password(&payload.password) {
        Ok(password) => password,
        Err(err) => {
            return to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                ),
                Err(ApiError::PasswordHashFailed(err.to_string())),
            )
        }
    };

    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => {
            return to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                ),
                Err(ApiError::TransactionCreationFailed),
            )
        }
    };

    let role = payload.user_type.role();
    let new_user = user::ActiveModel {
        username: Set(email.clone()),
        password: Set(password),
        full_name: Set(payload.full_name.trim().to_owned()),
        role: Set(role),
        ..Default::default()
    };
    let user = match new_user.insert(&txn).await {
        Ok(user) => user,
        // lost a race with another registration for the same email
        Err(_) => return error_response(StatusCode::CONFLICT, "Email is already registered"),
    };

    let now = Utc::now();
    let profile = match payload.user_type {
        UserType::Customer => customer::ActiveModel {
            user_id: Set(user.id),
            phone: Set(String::new()),
            address: Set(String::new()),
            joined_date: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map(|_| ()),
        UserType::Artisan => artisan::ActiveModel {
            user_id: Set(user.id),
            shop_name: Set(payload.shop_name.unwrap_or_default().trim().to_owned()),
            phone: Set(payload.phone_number.unwrap_or_default()),
            bio: Set(String::new()),
            location: Set(String::new()),
            craft: Set(String::new()),
            website: Set(None),
            is_verified: Set(false),
            joined_date: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map(|_| ()),
    };
    if let Err(err) = profile {
        return db_error_response(err);
    }
    if let Err(err) = txn.commit().await {
        return db_error_response(err);
    }

    info!(user_id = user.id, role = %role, "Registered user");
    token_response(StatusCode::CREATED, &user, &config)
}

async fn login(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(config): Extension<Arc<AppConfig>>,
    Json(payload): Json<LoginPayload>,
) -> Response {
    let email = payload.email.trim().to_lowercase();
    let user = match UserEntity::find()
        .filter(user::Column::Username.eq(&*email))
        .one(&*db)
        .await
    {
        Ok(user) => user,
        Err(err) => return db_error_response(err),
    };

    match user {
        Some(user) if user.check_hash(&payload.password).is_ok() => {
            token_response(StatusCode::OK, &user, &config)
        }
        _ => error_response(StatusCode::UNAUTHORIZED, "Invalid email or password"),
    }
}

// Tokens are stateless; the client drops its copy.
async fn logout() -> Response {
    to_response(
        (
            StatusCode::OK,
            Json(json!({ "message": "Logged out" })),
        ),
        Ok(()),
    )
}

fn token_response(status: StatusCode, user: &user::Model, config: &AppConfig) -> Response {
    match generate_token(user.id, user.role, config) {
        Ok(token) => to_response(
            (
                status,
                Json(json!({
                    "token": token,
                    "user_id": user.id,
                    "role": user.role,
                    "full_name": user.full_name,
                })),
            ),
            Ok(()),
        ),
        Err(err) => to_response(
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error" })),
            ),
            Err(ApiError::TokenGenerationFailed(err.to_string())),
        ),
    }
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum UserType {
    Customer,
    Artisan,
}

impl UserType {
    fn role(self) -> Role {
        match self {
            UserType::Customer => Role::Customer,
            UserType::Artisan => Role::Artisan,
        }
    }
}

#[derive(Deserialize, Validate)]
#[validate(schema(function = "validate_artisan_fields"))]
struct RegisterPayload {
    user_type: UserType,
    #[validate(length(min = 1, max = 100))]
    full_name: String,
    #[validate(email)]
    email: String,
    #[validate(length(min = 8, max = 128))]
    password: String,
    #[validate(must_match(other = "password"))]
    confirm_password: String,
    #[validate(length(min = 1, max = 100))]
    shop_name: Option<String>,
    #[validate(regex(path = *PHONE_REGEX))]
    phone_number: Option<String>,
}

fn validate_artisan_fields(payload: &RegisterPayload) -> Result<(), ValidationError> {
    if payload.user_type != UserType::Artisan {
        return Ok(());
    }
    let present = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.trim().is_empty());
    if present(&payload.shop_name) && present(&payload.phone_number) {
        Ok(())
    } else {
        Err(ValidationError::new("artisan_requires_shop_and_phone"))
    }
}

#[derive(Deserialize)]
struct LoginPayload {
    email: String,
    password: String,
}
