pub mod category;
pub mod order;

use axum::{middleware::from_fn_with_state, Router};

use crate::api::AppState;
use crate::entities::user::Role;
use crate::middleware::auth::auth_middleware;
use category::admin_category_router;
use order::admin_order_router;

pub fn admin_api_router(state: &AppState) -> Router {
    Router::new()
        .merge(admin_category_router())
        .merge(admin_order_router())
        .layer(from_fn_with_state(
            state.auth(Some(Role::Admin)),
            auth_middleware,
        ))
}
