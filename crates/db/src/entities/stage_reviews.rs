//! `SeaORM` Entity for stage_reviews table.
//!
//! One row per (application, stage, cycle).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "stage_reviews")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub application_id: Uuid,
    pub stage: String,
    pub cycle: i32,
    pub officer_id: Uuid,
    pub assigned_at: DateTimeWithTimeZone,
    pub approved: bool,
    pub approved_at: Option<DateTimeWithTimeZone>,
    pub rejected: bool,
    pub rejection_comments: Option<String>,
    pub rejected_at: Option<DateTimeWithTimeZone>,
    pub signature_applied: bool,
    pub signed_at: Option<DateTimeWithTimeZone>,
    pub signed_document_ref: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::applications::Entity",
        from = "Column::ApplicationId",
        to = "super::applications::Column::Id"
    )]
    Applications,
    #[sea_orm(
        belongs_to = "super::officers::Entity",
        from = "Column::OfficerId",
        to = "super::officers::Column::Id"
    )]
    Officers,
}

impl Related<super::applications::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Applications.def()
    }
}

impl Related<super::officers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Officers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
