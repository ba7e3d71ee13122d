//! In-process [`CartStore`] used by unit tests and local experiments.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::DbErr;
use std::collections::BTreeMap;
use tokio::sync::Mutex;

use super::store::{CartStore, CheckoutOutcome, LineSnapshot};
use crate::entities::{customer, order, order::Status, order_item, product};

#[derive(Default)]
struct Tables {
    next_id: i32,
    customers: BTreeMap<i32, customer::Model>,
    products: BTreeMap<i32, product::Model>,
    orders: BTreeMap<i32, order::Model>,
    items: BTreeMap<i32, order_item::Model>,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_customer(&self, user_id: i32) -> customer::Model {
        let mut tables = self.tables.lock().await;
        let now = Utc::now();
        let model = customer::Model {
            id: tables.next_id(),
            user_id,
            phone: String::new(),
            address: String::new(),
            joined_date: now,
            updated_at: now,
        };
        tables.customers.insert(model.id, model.clone());
        model
    }

    pub async fn add_product(
        &self,
        name: &str,
        price: Decimal,
        discount_price: Option<Decimal>,
        stock: i32,
    ) -> product::Model {
        let mut tables = self.tables.lock().await;
        let id = tables.next_id();
        let model = product::Model {
            id,
            artisan_id: 1,
            category_id: None,
            name: name.to_owned(),
            description: String::new(),
            price,
            discount_price,
            stock,
            is_featured: false,
            is_new: false,
            is_on_sale: discount_price.is_some(),
            rating: 0.0,
            rating_count: 0,
            slug: format!("{}-{id}", crate::entities::slug::slugify(name)),
            created_at: Utc::now(),
        };
        tables.products.insert(id, model.clone());
        model
    }

    pub async fn product_stock(&self, product_id: i32) -> Option<i32> {
        self.tables
            .lock()
            .await
            .products
            .get(&product_id)
            .map(|product| product.stock)
    }

    pub async fn orders(&self) -> Vec<order::Model> {
        self.tables.lock().await.orders.values().cloned().collect()
    }

    pub async fn items(&self) -> Vec<order_item::Model> {
        self.tables.lock().await.items.values().cloned().collect()
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn customer_for_user(&self, user_id: i32) -> Result<Option<customer::Model>, DbErr> {
        let tables = self.tables.lock().await;
        Ok(tables
            .customers
            .values()
            .find(|customer| customer.user_id == user_id)
            .cloned())
    }

    async fn find_product(&self, product_id: i32) -> Result<Option<product::Model>, DbErr> {
        Ok(self.tables.lock().await.products.get(&product_id).cloned())
    }

    async fn pending_order(&self, customer_id: i32) -> Result<Option<order::Model>, DbErr> {
        let tables = self.tables.lock().await;
        Ok(tables
            .orders
            .values()
            .find(|order| order.customer_id == customer_id && order.status == Status::Pending)
            .cloned())
    }

    async fn create_pending_order(&self, customer_id: i32) -> Result<order::Model, DbErr> {
        let mut tables = self.tables.lock().await;
        let now = Utc::now();
        let model = order::Model {
            id: tables.next_id(),
            customer_id,
            status: Status::Pending,
            created_at: now,
            updated_at: now,
        };
        tables.orders.insert(model.id, model.clone());
        Ok(model)
    }

    async fn find_order(&self, order_id: i32) -> Result<Option<order::Model>, DbErr> {
        Ok(self.tables.lock().await.orders.get(&order_id).cloned())
    }

    async fn placed_orders(&self, customer_id: i32) -> Result<Vec<order::Model>, DbErr> {
        let tables = self.tables.lock().await;
        // ids grow with time, so reverse id order is newest first
        Ok(tables
            .orders
            .values()
            .rev()
            .filter(|order| order.customer_id == customer_id && order.status != Status::Pending)
            .cloned()
            .collect())
    }

    async fn find_item(&self, item_id: i32) -> Result<Option<order_item::Model>, DbErr> {
        Ok(self.tables.lock().await.items.get(&item_id).cloned())
    }

    async fn find_line(
        &self,
        order_id: i32,
        product_id: i32,
    ) -> Result<Option<order_item::Model>, DbErr> {
        let tables = self.tables.lock().await;
        Ok(tables
            .items
            .values()
            .find(|item| item.order_id == order_id && item.product_id == product_id)
            .cloned())
    }

    async fn insert_line(
        &self,
        order_id: i32,
        product_id: i32,
        quantity: i32,
        unit_price: Decimal,
    ) -> Result<order_item::Model, DbErr> {
        let mut tables = self.tables.lock().await;
        let duplicate = tables
            .items
            .values()
            .any(|item| item.order_id == order_id && item.product_id == product_id);
        if duplicate {
            return Err(DbErr::Custom(format!(
                "order {order_id} already has a line for product {product_id}"
            )));
        }
        let model = order_item::Model {
            id: tables.next_id(),
            order_id,
            product_id,
            quantity,
            price_at_purchase: unit_price,
        };
        tables.items.insert(model.id, model.clone());
        Ok(model)
    }

    async fn update_line(
        &self,
        item: order_item::Model,
        quantity: i32,
        unit_price: Decimal,
    ) -> Result<order_item::Model, DbErr> {
        let mut tables = self.tables.lock().await;
        let stored = tables
            .items
            .get_mut(&item.id)
            .ok_or_else(|| DbErr::RecordNotFound(format!("order item {}", item.id)))?;
        stored.quantity = quantity;
        stored.price_at_purchase = unit_price;
        Ok(stored.clone())
    }

    async fn delete_line(&self, item_id: i32) -> Result<(), DbErr> {
        self.tables.lock().await.items.remove(&item_id);
        Ok(())
    }

    async fn lines_with_products(
        &self,
        order_id: i32,
    ) -> Result<Vec<(order_item::Model, product::Model)>, DbErr> {
        let tables = self.tables.lock().await;
        Ok(tables
            .items
            .values()
            .filter(|item| item.order_id == order_id)
            .filter_map(|item| {
                tables
                    .products
                    .get(&item.product_id)
                    .map(|product| (item.clone(), product.clone()))
            })
            .collect())
    }

    async fn complete_checkout(
        &self,
        order_id: i32,
        lines: &[LineSnapshot],
    ) -> Result<CheckoutOutcome, DbErr> {
        let mut tables = self.tables.lock().await;

        match tables.orders.get(&order_id) {
            Some(order) if order.status == Status::Pending => {}
            _ => return Ok(CheckoutOutcome::NotPending),
        }

        // Validate everything first so a failure leaves no partial writes.
        for line in lines {
            let available = tables
                .products
                .get(&line.product_id)
                .map(|product| product.stock)
                .unwrap_or(0);
            if available < line.quantity {
                return Ok(CheckoutOutcome::OutOfStock {
                    product_id: line.product_id,
                    requested: line.quantity,
                    available,
                });
            }
        }

        for line in lines {
            if let Some(product) = tables.products.get_mut(&line.product_id) {
                product.stock -= line.quantity;
            }
            if let Some(item) = tables.items.get_mut(&line.item_id) {
                item.price_at_purchase = line.unit_price;
            }
        }

        let order = tables
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| DbErr::RecordNotFound(format!("order {order_id}")))?;
        order.status = Status::Processing;
        order.updated_at = Utc::now();
        Ok(CheckoutOutcome::Completed(order.clone()))
    }
}
