use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use std::sync::Arc;

use crate::entities::{customer, order, order::Status, order_item, product};

/// Price frozen onto a line when the order leaves the cart.
#[derive(Clone, Debug, PartialEq)]
pub struct LineSnapshot {
    pub item_id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Clone, Debug, PartialEq)]
pub enum CheckoutOutcome {
    Completed(order::Model),
    OutOfStock {
        product_id: i32,
        requested: i32,
        available: i32,
    },
    /// The order was no longer pending when the transaction started.
    NotPending,
}

/// Persistence used by [`CartService`](super::CartService).
#[async_trait]
pub trait CartStore: Send + Sync {
    async fn customer_for_user(&self, user_id: i32) -> Result<Option<customer::Model>, DbErr>;
    async fn find_product(&self, product_id: i32) -> Result<Option<product::Model>, DbErr>;
    async fn pending_order(&self, customer_id: i32) -> Result<Option<order::Model>, DbErr>;
    async fn create_pending_order(&self, customer_id: i32) -> Result<order::Model, DbErr>;
    async fn find_order(&self, order_id: i32) -> Result<Option<order::Model>, DbErr>;
    /// Orders that already left the cart, newest first.
    async fn placed_orders(&self, customer_id: i32) -> Result<Vec<order::Model>, DbErr>;
    async fn find_item(&self, item_id: i32) -> Result<Option<order_item::Model>, DbErr>;
    async fn find_line(
        &self,
        order_id: i32,
        product_id: i32,
    ) -> Result<Option<order_item::Model>, DbErr>;
    async fn insert_line(
        &self,
        order_id: i32,
        product_id: i32,
        quantity: i32,
        unit_price: Decimal,
    ) -> Result<order_item::Model, DbErr>;
    async fn update_line(
        &self,
        item: order_item::Model,
        quantity: i32,
        unit_price: Decimal,
    ) -> Result<order_item::Model, DbErr>;
    async fn delete_line(&self, item_id: i32) -> Result<(), DbErr>;
    async fn lines_with_products(
        &self,
        order_id: i32,
    ) -> Result<Vec<(order_item::Model, product::Model)>, DbErr>;
    /// Decrements stock, freezes line prices and moves the order to
    /// `Processing`, all or nothing.
    async fn complete_checkout(
        &self,
        order_id: i32,
        lines: &[LineSnapshot],
    ) -> Result<CheckoutOutcome, DbErr>;
}

pub struct SeaOrmStore {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CartStore for SeaOrmStore {
    async fn customer_for_user(&self, user_id: i32) -> Result<Option<customer::Model>, DbErr> {
        customer::Entity::find()
            .filter(customer::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await
    }

    async fn find_product(&self, product_id: i32) -> Result<Option<product::Model>, DbErr> {
        product::Entity::find_by_id(product_id).one(&*self.db).await
    }

    async fn pending_order(&self, customer_id: i32) -> Result<Option<order::Model>, DbErr> {
        order::Entity::find()
            .filter(order::Column::CustomerId.eq(customer_id))
            .filter(order::Column::Status.eq(Status::Pending))
            .order_by_asc(order::Column::Id)
            .one(&*self.db)
            .await
    }

    async fn create_pending_order(&self, customer_id: i32) -> Result<order::Model, DbErr> {
        let now = Utc::now();
        order::ActiveModel {
            customer_id: Set(customer_id),
            status: Set(Status::Pending),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
    }

    async fn find_order(&self, order_id: i32) -> Result<Option<order::Model>, DbErr> {
        order::Entity::find_by_id(order_id).one(&*self.db).await
    }

    async fn placed_orders(&self, customer_id: i32) -> Result<Vec<order::Model>, DbErr> {
        order::Entity::find()
            .filter(order::Column::CustomerId.eq(customer_id))
            .filter(order::Column::Status.ne(Status::Pending))
            .order_by_desc(order::Column::CreatedAt)
            .order_by_desc(order::Column::Id)
            .all(&*self.db)
            .await
    }

    async fn find_item(&self, item_id: i32) -> Result<Option<order_item::Model>, DbErr> {
        order_item::Entity::find_by_id(item_id).one(&*self.db).await
    }

    async fn find_line(
        &self,
        order_id: i32,
        product_id: i32,
    ) -> Result<Option<order_item::Model>, DbErr> {
        order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .filter(order_item::Column::ProductId.eq(product_id))
            .one(&*self.db)
            .await
    }

    async fn insert_line(
        &self,
        order_id: i32,
        product_id: i32,
        quantity: i32,
        unit_price: Decimal,
    ) -> Result<order_item::Model, DbErr> {
        order_item::ActiveModel {
            order_id: Set(order_id),
            product_id: Set(product_id),
            quantity: Set(quantity),
            price_at_purchase: Set(unit_price),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
    }

    async fn update_line(
        &self,
        item: order_item::Model,
        quantity: i32,
        unit_price: Decimal,
    ) -> Result<order_item::Model, DbErr> {
        let mut item: order_item::ActiveModel = item.into();
        item.quantity = Set(quantity);
        item.price_at_purchase = Set(unit_price);
        item.update(&*self.db).await
    }

    async fn delete_line(&self, item_id: i32) -> Result<(), DbErr> {
        order_item::Entity::delete_by_id(item_id)
            .exec(&*self.db)
            .await
            .map(|_| ())
    }

    async fn lines_with_products(
        &self,
        order_id: i32,
    ) -> Result<Vec<(order_item::Model, product::Model)>, DbErr> {
        let rows = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .order_by_asc(order_item::Column::Id)
            .find_also_related(product::Entity)
            .all(&*self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(item, product)| product.map(|product| (item, product)))
            .collect())
    }

    async fn complete_checkout(
        &self,
        order_id: i32,
        lines: &[LineSnapshot],
    ) -> Result<CheckoutOutcome, DbErr> {
        let txn = self.db.begin().await?;

        let order = match order::Entity::find_by_id(order_id).one(&txn).await? {
            Some(order) if order.status == Status::Pending => order,
            _ => {
                txn.rollback().await?;
                return Ok(CheckoutOutcome::NotPending);
            }
        };

        for line in lines {
            let result = product::Entity::update_many()
                .col_expr(
                    product::Column::Stock,
                    Expr::col(product::Column::Stock).sub(line.quantity),
                )
                .filter(product::Column::Id.eq(line.product_id))
                .filter(product::Column::Stock.gte(line.quantity))
                .exec(&txn)
                .await?;

            if result.rows_affected == 0 {
                let available = product::Entity::find_by_id(line.product_id)
                    .one(&txn)
                    .await?
                    .map(|product| product.stock)
                    .unwrap_or(0);
                txn.rollback().await?;
                return Ok(CheckoutOutcome::OutOfStock {
                    product_id: line.product_id,
                    requested: line.quantity,
                    available,
                });
            }

            order_item::Entity::update_many()
                .col_expr(
                    order_item::Column::PriceAtPurchase,
                    Expr::value(line.unit_price),
                )
                .filter(order_item::Column::Id.eq(line.item_id))
                .exec(&txn)
                .await?;
        }

        let mut order: order::ActiveModel = order.into();
        order.status = Set(Status::Processing);
        order.updated_at = Set(Utc::now());
        let order = order.update(&txn).await?;

        txn.commit().await?;
        Ok(CheckoutOutcome::Completed(order))
    }
}
