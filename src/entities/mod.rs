pub mod user;
pub mod customer;
pub mod artisan;
pub mod category;
pub mod product;
pub mod order;
pub mod order_item;
pub mod wishlist;
pub mod review;
pub mod story;
pub mod slug;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Index, ActiveModelTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, Schema, Set, TransactionTrait,
};
use tracing::info;

pub async fn setup_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut tables = vec![
        schema.create_table_from_entity(user::Entity),
        schema.create_table_from_entity(customer::Entity),
        schema.create_table_from_entity(artisan::Entity),
        schema.create_table_from_entity(category::Entity),
        schema.create_table_from_entity(product::Entity),
        schema.create_table_from_entity(order::Entity),
        schema.create_table_from_entity(order_item::Entity),
        schema.create_table_from_entity(wishlist::Entity),
        schema.create_table_from_entity(review::Entity),
        schema.create_table_from_entity(story::Entity),
    ];
    for table in tables.iter_mut() {
        table.if_not_exists();
        db.execute(backend.build(&*table)).await?;
    }

    // One row per product inside an order, one wishlist entry per product.
    let unique_line = Index::create()
        .if_not_exists()
        .name("idx_order_items_order_product")
        .table(order_item::Entity)
        .col(order_item::Column::OrderId)
        .col(order_item::Column::ProductId)
        .unique()
        .to_owned();
    let unique_wish = Index::create()
        .if_not_exists()
        .name("idx_wishlists_customer_product")
        .table(wishlist::Entity)
        .col(wishlist::Column::CustomerId)
        .col(wishlist::Column::ProductId)
        .unique()
        .to_owned();
    db.execute(backend.build(&unique_line)).await?;
    db.execute(backend.build(&unique_wish)).await?;

    Ok(())
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)?
        .to_string();

    Ok(password_hash)
}

/// Seeds an admin, one artisan with a small catalog and one customer.
/// Does nothing when users already exist.
pub async fn primary_setup(db: &DatabaseConnection) -> Result<(), DbErr> {
    if user::Entity::find().count(db).await? > 0 {
        return Ok(());
    }

    let password_hash =
        hash_password("Secret15").map_err(|err| DbErr::Custom(err.to_string()))?;
    let now = Utc::now();

    let txn = db.begin().await?;

    user::ActiveModel {
        username: Set("admin@rari.local".to_owned()),
        password: Set(password_hash.clone()),
        full_name: Set("Administrator".to_owned()),
        role: Set(user::Role::Admin),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let artisan_user = user::ActiveModel {
        username: Set("artisan@rari.local".to_owned()),
        password: Set(password_hash.clone()),
        full_name: Set("Demo Artisan".to_owned()),
        role: Set(user::Role::Artisan),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let artisan = artisan::ActiveModel {
        user_id: Set(artisan_user.id),
        shop_name: Set("Clay & Thread".to_owned()),
        phone: Set("+8801700000000".to_owned()),
        bio: Set("Pottery and hand-stitched textiles.".to_owned()),
        location: Set("Dhaka".to_owned()),
        craft: Set("Pottery".to_owned()),
        website: Set(None),
        is_verified: Set(true),
        joined_date: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let customer_user = user::ActiveModel {
        username: Set("customer@rari.local".to_owned()),
        password: Set(password_hash),
        full_name: Set("Demo Customer".to_owned()),
        role: Set(user::Role::Customer),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    customer::ActiveModel {
        user_id: Set(customer_user.id),
        phone: Set(String::new()),
        address: Set(String::new()),
        joined_date: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let pottery = category::ActiveModel {
        name: Set("Pottery".to_owned()),
        description: Set("Wheel-thrown and hand-built ceramics.".to_owned()),
        slug: Set(slug::slugify("Pottery")),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let demo_products = [
        ("Terracotta Vase", Decimal::new(2500, 2), None, 10),
        ("Glazed Tea Cup", Decimal::new(800, 2), Some(Decimal::new(600, 2)), 25),
    ];
    for (name, price, discount_price, stock) in demo_products {
        product::ActiveModel {
            artisan_id: Set(artisan.id),
            category_id: Set(Some(pottery.id)),
            name: Set(name.to_owned()),
            description: Set(format!("{name} made by hand.")),
            price: Set(price),
            discount_price: Set(discount_price),
            stock: Set(stock),
            is_featured: Set(true),
            is_new: Set(true),
            is_on_sale: Set(discount_price.is_some()),
            rating: Set(0.0),
            rating_count: Set(0),
            slug: Set(slug::slugify(name)),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;
    info!("Seeded demo marketplace data");
    Ok(())
}
