//! `SeaORM` Entity for applications table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "applications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub application_number: String,
    pub applicant_id: Uuid,
    pub applicant_name: String,
    pub applicant_email: String,
    pub applicant_mobile: Option<String>,
    pub position_type: String,
    pub status: String,
    pub cycle: i32,
    pub version: i32,
    pub certificate_number: Option<String>,
    pub submitted_at: Option<DateTimeWithTimeZone>,
    pub completed_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::application_status_history::Entity")]
    ApplicationStatusHistory,
    #[sea_orm(has_many = "super::stage_reviews::Entity")]
    StageReviews,
    #[sea_orm(has_many = "super::application_documents::Entity")]
    ApplicationDocuments,
    #[sea_orm(has_many = "super::payments::Entity")]
    Payments,
}

impl Related<super::application_status_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApplicationStatusHistory.def()
    }
}

impl Related<super::stage_reviews::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StageReviews.def()
    }
}

impl Related<super::application_documents::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApplicationDocuments.def()
    }
}

impl Related<super::payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
