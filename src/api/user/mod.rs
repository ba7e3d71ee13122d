pub mod cart;
pub mod profile;
pub mod review;
pub mod wishlist;

use axum::{
    http::StatusCode, middleware::from_fn_with_state, response::Response, Router,
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use crate::api::{db_error_response, error_response, AppState};
use crate::entities::{customer, user::Role};
use crate::middleware::auth::{auth_middleware, identity_middleware, Claims};
use cart::cart_router;
use profile::profile_router;
use review::review_router;
use wishlist::wishlist_router;

pub fn user_api_router(state: &AppState) -> Router {
    // anonymous callers reach the cart handlers and get a 401 from the service
    let cart = cart_router().layer(from_fn_with_state(state.auth(None), identity_middleware));

    let customer = Router::new()
        .merge(wishlist_router())
        .merge(review_router())
        .merge(profile_router())
        .layer(from_fn_with_state(
            state.auth(Some(Role::Customer)),
            auth_middleware,
        ));

    Router::new().merge(cart).merge(customer)
}

/// Customer profile of the authenticated caller.
pub(crate) async fn customer_profile(
    db: &DatabaseConnection,
    claims: &Claims,
) -> Result<customer::Model, Response> {
    match customer::Entity::find()
        .filter(customer::Column::UserId.eq(claims.user_id))
        .one(db)
        .await
    {
        Ok(Some(customer)) => Ok(customer),
        Ok(None) => Err(error_response(
            StatusCode::NOT_FOUND,
            "Customer profile not found",
        )),
        Err(err) => Err(db_error_response(err)),
    }
}
