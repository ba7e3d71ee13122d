use sea_orm::DbErr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CartError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("Login required")]
    AuthenticationRequired,
    #[error("Cart item {item_id} belongs to another customer")]
    AuthorizationError { item_id: i32 },
    #[error("Cart is empty")]
    EmptyCart,
    #[error("Not enough stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: i32,
        requested: i32,
        available: i32,
    },
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}
