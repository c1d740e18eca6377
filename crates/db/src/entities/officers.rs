//! `SeaORM` Entity for officers table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "officers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub mobile: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::stage_reviews::Entity")]
    StageReviews,
}

impl Related<super::stage_reviews::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StageReviews.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
