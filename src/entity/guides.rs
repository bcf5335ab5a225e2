use sea_orm::entity::prelude::*;
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "guides")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    /// JSON array of language codes.
    pub languages: Value,
    pub experience_years: i32,
    pub average_rating: Option<f64>,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::tour_guides::Entity")]
    TourGuides,
}

impl Related<super::tour_guides::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TourGuides.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
