use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "stories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub artisan_id: i32,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    // comma separated
    #[sea_orm(default_value = "")]
    pub tags: String,
    pub created_at: DateTimeUtc,
}

impl Model {
    pub fn tag_list(&self) -> Vec<&str> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .collect()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::artisan::Entity",
        from = "Column::ArtisanId",
        to = "super::artisan::Column::Id",
        on_delete = "Cascade",
    )]
    Artisan,
}

impl Related<super::artisan::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Artisan.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
