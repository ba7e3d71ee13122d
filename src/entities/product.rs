use sea_orm::entity::prelude::*;
use serde::Serialize;

use crate::pricing;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub artisan_id: i32,
    pub category_id: Option<i32>,
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))", nullable)]
    pub discount_price: Option<Decimal>,
    #[sea_orm(default_value = 1)]
    pub stock: i32,
    #[sea_orm(default_value = false)]
    pub is_featured: bool,
    #[sea_orm(default_value = false)]
    pub is_new: bool,
    #[sea_orm(default_value = false)]
    pub is_on_sale: bool,
    #[sea_orm(default_value = 0.0)]
    pub rating: f64,
    #[sea_orm(default_value = 0)]
    pub rating_count: i32,
    #[sea_orm(unique)]
    pub slug: String,
    pub created_at: DateTimeUtc,
}

impl Model {
    /// Price a customer pays for one unit right now.
    pub fn unit_price(&self) -> Decimal {
        pricing::effective_price(self.price, self.discount_price)
    }

    /// Running mean after one more review with `stars`.
    pub fn rating_with(&self, stars: i32) -> (f64, i32) {
        let count = self.rating_count.max(0);
        let total = self.rating * f64::from(count) + f64::from(stars);
        let count = count + 1;
        (total / f64::from(count), count)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::artisan::Entity",
        from = "Column::ArtisanId",
        to = "super::artisan::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade",
    )]
    Artisan,
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull",
    )]
    Category,
    #[sea_orm(has_many = "super::review::Entity")]
    Review,
}

impl Related<super::artisan::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Artisan.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Review.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn product(rating: f64, rating_count: i32) -> Model {
        Model {
            id: 1,
            artisan_id: 1,
            category_id: None,
            name: "Bowl".to_owned(),
            description: String::new(),
            price: dec!(10.00),
            discount_price: None,
            stock: 1,
            is_featured: false,
            is_new: false,
            is_on_sale: false,
            rating,
            rating_count,
            slug: "bowl".to_owned(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn first_review_sets_the_rating() {
        assert_eq!(product(0.0, 0).rating_with(4), (4.0, 1));
    }

    #[test]
    fn later_reviews_keep_a_running_mean() {
        let (rating, count) = product(4.0, 2).rating_with(1);
        assert_eq!(count, 3);
        assert!((rating - 3.0).abs() < f64::EPSILON);
    }
}
