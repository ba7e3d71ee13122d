use crate::cart::Identity;
use crate::config::AppConfig;
use crate::entities::user::{Entity as UserEntity, Role};
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::{Deserialize, Serialize};
use std::{str::FromStr, sync::Arc};
use thiserror::Error;
use tracing::debug;

/// Rejects requests without a valid token for `state.role` (any role when
/// `None`). On success the handler sees both `Claims` and `Identity`.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = bearer_token(&req).ok_or(StatusCode::UNAUTHORIZED)?;

    let claims = match validate_token(&state, &token).await {
        Ok(claims) => claims,
        Err(AuthMiddlewareError::InternalServerError) => {
            return Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
        Err(err) => {
            debug!(error = %err, "Rejected bearer token");
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    req.extensions_mut().insert(claims.identity());
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Never rejects: resolves the caller to an `Identity`, falling back to
/// `Identity::Anonymous`, and leaves the decision to the handler.
pub async fn identity_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    let identity = match bearer_token(&req) {
        Some(token) => match validate_token(&state, &token).await {
            Ok(claims) => claims.identity(),
            Err(err) => {
                debug!(error = %err, "Treating caller as anonymous");
                Identity::Anonymous
            }
        },
        None => Identity::Anonymous,
    };

    req.extensions_mut().insert(identity);
    next.run(req).await
}

// Owned, so no borrow of the request is held across an await.
fn bearer_token(req: &Request) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::to_owned)
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i32,
    pub role: String,
    pub exp: usize,
}

impl Claims {
    pub fn identity(&self) -> Identity {
        match Role::from_str(&self.role) {
            Ok(role) => Identity::User {
                user_id: self.user_id,
                role,
            },
            Err(_) => Identity::Anonymous,
        }
    }
}

#[derive(Clone)]
pub struct AuthState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<AppConfig>,
    pub role: Option<Role>,
}

pub fn generate_token(
    user_id: i32,
    role: Role,
    config: &AppConfig,
) -> Result<String, AuthMiddlewareError> {
    let exp = Utc::now()
        .checked_add_signed(Duration::hours(config.token_ttl_hours))
        .ok_or(AuthMiddlewareError::GenerationFail)?
        .timestamp() as usize;

    let claims = Claims {
        user_id,
        role: role.to_string(),
        exp,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|_| AuthMiddlewareError::GenerationFail)
}

pub async fn validate_token(
    state: &AuthState,
    token: &str,
) -> Result<Claims, AuthMiddlewareError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.config.secret.as_bytes()),
        &validation,
    )
    .map_err(|_| AuthMiddlewareError::TokenExpired)?
    .claims;

    let role = Role::from_str(&claims.role).map_err(|_| AuthMiddlewareError::ValidationFail)?;

    // The user may have been deleted or re-roled since the token was issued.
    let user = UserEntity::find_by_id(claims.user_id)
        .one(&*state.db)
        .await
        .map_err(|_| AuthMiddlewareError::InternalServerError)?
        .ok_or(AuthMiddlewareError::InvalidUserOrRole)?;

    if user.role != role {
        return Err(AuthMiddlewareError::InvalidUserOrRole);
    }
    match state.role {
        Some(required) if required != role => Err(AuthMiddlewareError::InvalidUserOrRole),
        _ => Ok(claims),
    }
}

#[derive(Error, Debug)]
pub enum AuthMiddlewareError {
    #[error("Invalid user id or role")]
    InvalidUserOrRole,
    #[error("Token expired")]
    TokenExpired,
    #[error("Failed to validate token")]
    ValidationFail,
    #[error("Failed to generate token")]
    GenerationFail,
    #[error("Internal server error")]
    InternalServerError,
}
