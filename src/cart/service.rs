use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::error::CartError;
use super::locks::CustomerLocks;
use super::store::{CartStore, CheckoutOutcome, LineSnapshot};
use crate::entities::{customer, order, order::Status, order_item, product, user::Role};
use crate::pricing;

/// Who is calling. Built by the identity middleware from the bearer token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Identity {
    Anonymous,
    User { user_id: i32, role: Role },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CartLine {
    pub item_id: i32,
    pub product_id: i32,
    pub name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

impl CartLine {
    fn new(item: &order_item::Model, product: &product::Model, unit_price: Decimal) -> Self {
        CartLine {
            item_id: item.id,
            product_id: product.id,
            name: product.name.clone(),
            quantity: item.quantity,
            unit_price,
            line_total: pricing::line_total(unit_price, item.quantity),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CartView {
    pub order: Option<order::Model>,
    pub lines: Vec<CartLine>,
    pub total: Decimal,
}

impl CartView {
    fn empty() -> Self {
        CartView {
            order: None,
            lines: Vec::new(),
            total: Decimal::ZERO,
        }
    }

    fn from_lines(order: order::Model, lines: Vec<CartLine>) -> Self {
        let total = pricing::cart_total(lines.iter().map(|line| (line.unit_price, line.quantity)));
        CartView {
            order: Some(order),
            lines,
            total,
        }
    }
}

/// Owns the customer's pending order and everything that mutates it.
pub struct CartService {
    store: Arc<dyn CartStore>,
    locks: CustomerLocks,
}

impl CartService {
    pub fn new(store: Arc<dyn CartStore>) -> Self {
        Self {
            store,
            locks: CustomerLocks::new(),
        }
    }

    async fn customer(&self, identity: &Identity) -> Result<customer::Model, CartError> {
        match identity {
            Identity::Anonymous => Err(CartError::AuthenticationRequired),
            Identity::User { user_id, .. } => self
                .store
                .customer_for_user(*user_id)
                .await?
                .ok_or_else(|| CartError::NotFound("Customer profile".to_owned())),
        }
    }

    /// Adds one unit of `product_id` to the caller's cart, creating the cart
    /// on first use. Returns the affected line.
    #[instrument(skip(self))]
    pub async fn add_to_cart(
        &self,
        identity: &Identity,
        product_id: i32,
    ) -> Result<order_item::Model, CartError> {
        let customer = self.customer(identity).await?;
        let _guard = self.locks.acquire(customer.id).await;

        let product = self
            .store
            .find_product(product_id)
            .await?
            .ok_or_else(|| CartError::NotFound(format!("Product {product_id}")))?;

        let pending = self.store.pending_order(customer.id).await?;
        let existing_line = match &pending {
            Some(order) => self.store.find_line(order.id, product.id).await?,
            None => None,
        };

        let quantity = existing_line.as_ref().map_or(1, |line| line.quantity + 1);
        if quantity > product.stock {
            return Err(CartError::InsufficientStock {
                product_id: product.id,
                requested: quantity,
                available: product.stock,
            });
        }

        let order = match pending {
            Some(order) => order,
            None => {
                let order = self.store.create_pending_order(customer.id).await?;
                info!(customer_id = customer.id, order_id = order.id, "Opened cart");
                order
            }
        };

        let unit_price = product.unit_price();
        let line = match existing_line {
            Some(line) => self.store.update_line(line, quantity, unit_price).await?,
            None => {
                self.store
                    .insert_line(order.id, product.id, quantity, unit_price)
                    .await?
            }
        };

        info!(
            customer_id = customer.id,
            order_id = order.id,
            product_id = product.id,
            quantity = line.quantity,
            "Added product to cart"
        );
        Ok(line)
    }

    #[instrument(skip(self))]
    pub async fn remove_from_cart(
        &self,
        identity: &Identity,
        item_id: i32,
    ) -> Result<(), CartError> {
        let customer = self.customer(identity).await?;
        let _guard = self.locks.acquire(customer.id).await;

        let not_found = || CartError::NotFound(format!("Cart item {item_id}"));
        let item = self.store.find_item(item_id).await?.ok_or_else(not_found)?;
        let order = self
            .store
            .find_order(item.order_id)
            .await?
            .ok_or_else(not_found)?;

        if order.customer_id != customer.id {
            warn!(
                customer_id = customer.id,
                owner_id = order.customer_id,
                item_id,
                "Refused to remove another customer's cart item"
            );
            return Err(CartError::AuthorizationError { item_id });
        }
        // Lines of placed orders are history, not cart contents.
        if order.status != Status::Pending {
            return Err(not_found());
        }

        self.store.delete_line(item_id).await?;
        info!(customer_id = customer.id, item_id, "Removed cart item");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn view_cart(&self, identity: &Identity) -> Result<CartView, CartError> {
        let customer = self.customer(identity).await?;

        let Some(order) = self.store.pending_order(customer.id).await? else {
            return Ok(CartView::empty());
        };

        let lines = self
            .store
            .lines_with_products(order.id)
            .await?
            .iter()
            .map(|(item, product)| CartLine::new(item, product, product.unit_price()))
            .collect();

        Ok(CartView::from_lines(order, lines))
    }

    /// Moves the pending order to `Processing`, taking stock and freezing
    /// line prices on the way.
    #[instrument(skip(self))]
    pub async fn checkout(&self, identity: &Identity) -> Result<order::Model, CartError> {
        let customer = self.customer(identity).await?;
        let _guard = self.locks.acquire(customer.id).await;

        let order = self
            .store
            .pending_order(customer.id)
            .await?
            .ok_or(CartError::EmptyCart)?;

        let lines = self.store.lines_with_products(order.id).await?;
        if lines.is_empty() {
            return Err(CartError::EmptyCart);
        }

        let mut snapshots = Vec::with_capacity(lines.len());
        for (item, product) in &lines {
            if item.quantity > product.stock {
                return Err(CartError::InsufficientStock {
                    product_id: product.id,
                    requested: item.quantity,
                    available: product.stock,
                });
            }
            snapshots.push(LineSnapshot {
                item_id: item.id,
                product_id: product.id,
                quantity: item.quantity,
                unit_price: product.unit_price(),
            });
        }

        match self.store.complete_checkout(order.id, &snapshots).await? {
            CheckoutOutcome::Completed(order) => {
                info!(customer_id = customer.id, order_id = order.id, "Checked out");
                Ok(order)
            }
            CheckoutOutcome::OutOfStock {
                product_id,
                requested,
                available,
            } => Err(CartError::InsufficientStock {
                product_id,
                requested,
                available,
            }),
            CheckoutOutcome::NotPending => Err(CartError::EmptyCart),
        }
    }

    /// Placed orders with the prices that were frozen at checkout.
    #[instrument(skip(self))]
    pub async fn orders(&self, identity: &Identity) -> Result<Vec<CartView>, CartError> {
        let customer = self.customer(identity).await?;

        let mut history = Vec::new();
        for order in self.store.placed_orders(customer.id).await? {
            let lines = self
                .store
                .lines_with_products(order.id)
                .await?
                .iter()
                .map(|(item, product)| CartLine::new(item, product, item.price_at_purchase))
                .collect();
            history.push(CartView::from_lines(order, lines));
        }
        Ok(history)
    }
}
