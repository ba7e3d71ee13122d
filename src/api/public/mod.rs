pub mod artisan;
pub mod auth;
pub mod category;
pub mod home;
pub mod product;
pub mod story;

use axum::Router;

use artisan::artisan_router;
use category::category_router;
use home::home_router;
use product::product_router;
use story::story_router;

pub fn public_api_router() -> Router {
    Router::new()
        .merge(home_router())
        .merge(product_router())
        .merge(category_router())
        .merge(artisan_router())
        .merge(story_router())
}
