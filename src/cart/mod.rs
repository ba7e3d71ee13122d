//! Shopping cart and order lifecycle.
//!
//! A customer's cart is their single `Pending` order. [`CartService`] is the
//! only thing that creates, mutates or checks out that order; persistence goes
//! through the [`CartStore`] trait so the service runs against SeaORM in the
//! server and against [`MemoryStore`] in tests.

mod error;
mod locks;
pub mod memory;
mod service;
mod store;

pub use error::CartError;
pub use locks::{CustomerGuard, CustomerLocks};
pub use memory::MemoryStore;
pub use service::{CartLine, CartService, CartView, Identity};
pub use store::{CartStore, CheckoutOutcome, LineSnapshot, SeaOrmStore};
