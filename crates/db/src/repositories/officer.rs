//! Officer repository and workload-based assignment.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use tracing::info;
use uuid::Uuid;

use permitflow_core::workflow::{OfficerRole, WorkflowError};

use crate::entities::{officers, stage_reviews};

use super::db_error;

/// Input for registering an officer.
#[derive(Debug, Clone)]
pub struct CreateOfficerInput {
    /// Full name.
    pub name: String,
    /// Unique email.
    pub email: String,
    /// Mobile number.
    pub mobile: Option<String>,
    /// Role held.
    pub role: OfficerRole,
}

/// Officer repository.
#[derive(Debug, Clone)]
pub struct OfficerRepository {
    db: DatabaseConnection,
}

impl OfficerRepository {
    /// Creates a new officer repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Registers an active officer.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a blank name or email, `Database` on insert failure.
    pub async fn create(&self, input: CreateOfficerInput) -> Result<officers::Model, WorkflowError> {
        if input.name.trim().is_empty() || input.email.trim().is_empty() {
            return Err(WorkflowError::Validation(
                "officer name and email are required".to_string(),
            ));
        }
        let officer = officers::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name.trim().to_string()),
            email: Set(input.email.trim().to_lowercase()),
            mobile: Set(input.mobile),
            role: Set(input.role.as_str().to_string()),
            is_active: Set(true),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await
        .map_err(db_error)?;

        info!(officer_id = %officer.id, role = %input.role, "Officer registered");
        Ok(officer)
    }

    /// Finds an officer by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<officers::Model>, WorkflowError> {
        officers::Entity::find()
            .filter(officers::Column::Email.eq(email.trim().to_lowercase()))
            .one(&self.db)
            .await
            .map_err(db_error)
    }

    /// Active officers holding `role`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_active(&self, role: OfficerRole) -> Result<Vec<officers::Model>, WorkflowError> {
        active_officers(&self.db, role).await
    }

    /// Stops assigning new work to an officer. Existing assignments stay.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn deactivate(&self, officer_id: Uuid) -> Result<(), WorkflowError> {
        officers::Entity::update_many()
            .col_expr(
                officers::Column::IsActive,
                sea_orm::sea_query::Expr::value(false),
            )
            .filter(officers::Column::Id.eq(officer_id))
            .exec(&self.db)
            .await
            .map_err(db_error)?;
        Ok(())
    }
}

async fn active_officers<C: ConnectionTrait>(
    conn: &C,
    role: OfficerRole,
) -> Result<Vec<officers::Model>, WorkflowError> {
    officers::Entity::find()
        .filter(officers::Column::Role.eq(role.as_str()))
        .filter(officers::Column::IsActive.eq(true))
        .order_by_asc(officers::Column::CreatedAt)
        .order_by_asc(officers::Column::Id)
        .all(conn)
        .await
        .map_err(db_error)
}

/// Picks the active officer of `role` with the fewest open reviews.
/// Ties go to the oldest officer record.
///
/// # Errors
///
/// Returns `NoOfficerAvailable` if nobody holds the role.
pub(crate) async fn select_officer<C: ConnectionTrait>(
    conn: &C,
    role: OfficerRole,
) -> Result<officers::Model, WorkflowError> {
    let candidates = active_officers(conn, role).await?;
    if candidates.is_empty() {
        return Err(WorkflowError::NoOfficerAvailable(role));
    }

    let ids: Vec<Uuid> = candidates.iter().map(|o| o.id).collect();
    let open = stage_reviews::Entity::find()
        .filter(stage_reviews::Column::OfficerId.is_in(ids))
        .filter(stage_reviews::Column::Approved.eq(false))
        .filter(stage_reviews::Column::Rejected.eq(false))
        .all(conn)
        .await
        .map_err(db_error)?;

    let mut workload: HashMap<Uuid, usize> = HashMap::new();
    for review in &open {
        *workload.entry(review.officer_id).or_default() += 1;
    }

    // min_by_key keeps the first minimum, i.e. the oldest officer
    candidates
        .into_iter()
        .min_by_key(|o| workload.get(&o.id).copied().unwrap_or(0))
        .ok_or(WorkflowError::NoOfficerAvailable(role))
}
