pub mod product;
pub mod story;

use axum::{http::StatusCode, middleware::from_fn_with_state, response::Response, Router};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

use crate::api::{db_error_response, error_response, AppState};
use crate::entities::{artisan, user::Role};
use crate::middleware::auth::{auth_middleware, Claims};
use product::artisan_product_router;
use story::artisan_story_router;

pub fn artisan_api_router(state: &AppState) -> Router {
    Router::new()
        .merge(artisan_product_router())
        .merge(artisan_story_router())
        .layer(from_fn_with_state(
            state.auth(Some(Role::Artisan)),
            auth_middleware,
        ))
}

/// Shop of the authenticated artisan.
pub(crate) async fn artisan_profile<C: ConnectionTrait>(
    db: &C,
    claims: &Claims,
) -> Result<artisan::Model, Response> {
    match artisan::Entity::find()
        .filter(artisan::Column::UserId.eq(claims.user_id))
        .one(db)
        .await
    {
        Ok(Some(artisan)) => Ok(artisan),
        Ok(None) => Err(error_response(
            StatusCode::NOT_FOUND,
            "Artisan profile not found",
        )),
        Err(err) => Err(db_error_response(err)),
    }
}
