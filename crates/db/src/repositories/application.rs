//! Application repository: drafts, lookups and the detail view.

use chrono::{Datelike, Utc};
use rand::Rng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use permitflow_core::verification::{DocumentRecord, DocumentType};
use permitflow_core::workflow::{
    Actor, ActorKind, ApplicationStatus, PositionType, Stage, StageReview, WorkflowError,
};
use permitflow_shared::types::{PageRequest, PageResponse};

use crate::entities::{
    application_documents, application_status_history, applications, payments, stage_reviews,
};

use super::db_error;

/// Input for creating a draft application.
#[derive(Debug, Clone)]
pub struct CreateApplicationInput {
    /// Applicant's full name.
    pub applicant_name: String,
    /// Applicant's email.
    pub applicant_email: String,
    /// Applicant's mobile number.
    pub applicant_mobile: Option<String>,
    /// Position applied for.
    pub position_type: PositionType,
}

/// Everything known about one application.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationDetails {
    /// The application row.
    pub application: applications::Model,
    /// Uploaded and generated documents.
    pub documents: Vec<application_documents::Model>,
    /// Stage reviews of every cycle, oldest first.
    pub reviews: Vec<stage_reviews::Model>,
    /// Status history, oldest first.
    pub history: Vec<application_status_history::Model>,
    /// Payment attempts, oldest first.
    pub payments: Vec<payments::Model>,
}

/// Application repository.
#[derive(Debug, Clone)]
pub struct ApplicationRepository {
    db: DatabaseConnection,
}

impl ApplicationRepository {
    /// Creates a new application repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a draft for the acting applicant.
    ///
    /// # Errors
    ///
    /// * `Unauthorized` if the actor is not an applicant
    /// * `Validation` for blank name or email
    pub async fn create_draft(
        &self,
        actor: &Actor,
        input: CreateApplicationInput,
    ) -> Result<applications::Model, WorkflowError> {
        if actor.kind != ActorKind::Applicant {
            return Err(WorkflowError::Unauthorized(
                "only applicants create applications".to_string(),
            ));
        }
        let name = input.applicant_name.trim();
        let email = input.applicant_email.trim();
        if name.is_empty() || email.is_empty() {
            return Err(WorkflowError::Validation(
                "applicant name and email are required".to_string(),
            ));
        }

        let application_number = self.unused_application_number().await?;
        let now = Utc::now().into();
        let model = applications::ActiveModel {
            id: Set(Uuid::new_v4()),
            application_number: Set(application_number),
            applicant_id: Set(actor.id),
            applicant_name: Set(name.to_string()),
            applicant_email: Set(email.to_string()),
            applicant_mobile: Set(input.applicant_mobile.filter(|m| !m.trim().is_empty())),
            position_type: Set(input.position_type.as_str().to_string()),
            status: Set(ApplicationStatus::Draft.as_str().to_string()),
            cycle: Set(0),
            version: Set(0),
            certificate_number: Set(None),
            submitted_at: Set(None),
            completed_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(db_error)?;

        info!(
            application_id = %model.id,
            application_number = %model.application_number,
            applicant_id = %actor.id,
            "Draft application created"
        );
        Ok(model)
    }

    async fn unused_application_number(&self) -> Result<String, WorkflowError> {
        let year = Utc::now().year();
        for _ in 0..5 {
            let candidate = format!("PF-{year}-{:06}", rand::rng().random_range(0..1_000_000));
            let taken = applications::Entity::find()
                .filter(applications::Column::ApplicationNumber.eq(&candidate))
                .count(&self.db)
                .await
                .map_err(db_error)?;
            if taken == 0 {
                return Ok(candidate);
            }
        }
        Err(WorkflowError::Database(
            "could not allocate an application number".to_string(),
        ))
    }

    /// Finds an application.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationNotFound` if it does not exist.
    pub async fn find_by_id(&self, id: Uuid) -> Result<applications::Model, WorkflowError> {
        find_application(&self.db, id).await
    }

    /// Lists the acting applicant's applications, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_for_applicant(
        &self,
        applicant_id: Uuid,
        page: &PageRequest,
    ) -> Result<PageResponse<applications::Model>, WorkflowError> {
        let page = page.normalized();
        let paginator = applications::Entity::find()
            .filter(applications::Column::ApplicantId.eq(applicant_id))
            .order_by_desc(applications::Column::CreatedAt)
            .paginate(&self.db, page.limit());
        let total = paginator.num_items().await.map_err(db_error)?;
        let data = paginator
            .fetch_page(u64::from(page.page - 1))
            .await
            .map_err(db_error)?;
        Ok(PageResponse::new(data, page.page, page.per_page, total))
    }

    /// Full detail view. Applicants see only their own applications.
    ///
    /// # Errors
    ///
    /// * `ApplicationNotFound` if it does not exist
    /// * `Unauthorized` for another applicant's application
    pub async fn details(
        &self,
        id: Uuid,
        actor: &Actor,
    ) -> Result<ApplicationDetails, WorkflowError> {
        let application = find_application(&self.db, id).await?;
        ensure_can_view(&application, actor)?;

        let documents = application_documents::Entity::find()
            .filter(application_documents::Column::ApplicationId.eq(id))
            .order_by_asc(application_documents::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_error)?;
        let reviews = stage_reviews::Entity::find()
            .filter(stage_reviews::Column::ApplicationId.eq(id))
            .order_by_asc(stage_reviews::Column::Cycle)
            .order_by_asc(stage_reviews::Column::AssignedAt)
            .all(&self.db)
            .await
            .map_err(db_error)?;
        let history = status_history(&self.db, id).await?;
        let payments = payments::Entity::find()
            .filter(payments::Column::ApplicationId.eq(id))
            .order_by_asc(payments::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_error)?;

        Ok(ApplicationDetails {
            application,
            documents,
            reviews,
            history,
            payments,
        })
    }
}

/// Applicants may see their own applications; officers see all.
pub(crate) fn ensure_can_view(
    application: &applications::Model,
    actor: &Actor,
) -> Result<(), WorkflowError> {
    match actor.kind {
        ActorKind::Applicant if actor.id != application.applicant_id => Err(
            WorkflowError::Unauthorized("application belongs to another applicant".to_string()),
        ),
        _ => Ok(()),
    }
}

pub(crate) async fn find_application<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<applications::Model, WorkflowError> {
    applications::Entity::find_by_id(id)
        .one(conn)
        .await
        .map_err(db_error)?
        .ok_or(WorkflowError::ApplicationNotFound(id))
}

pub(crate) async fn status_history<C: ConnectionTrait>(
    conn: &C,
    application_id: Uuid,
) -> Result<Vec<application_status_history::Model>, WorkflowError> {
    application_status_history::Entity::find()
        .filter(application_status_history::Column::ApplicationId.eq(application_id))
        .order_by_asc(application_status_history::Column::CreatedAt)
        .all(conn)
        .await
        .map_err(db_error)
}

pub(crate) fn parse_status(model: &applications::Model) -> Result<ApplicationStatus, WorkflowError> {
    ApplicationStatus::parse(&model.status).ok_or_else(|| {
        WorkflowError::Database(format!(
            "application {} has unknown status '{}'",
            model.id, model.status
        ))
    })
}

pub(crate) fn parse_position(model: &applications::Model) -> Result<PositionType, WorkflowError> {
    PositionType::parse(&model.position_type).ok_or_else(|| {
        WorkflowError::Database(format!(
            "application {} has unknown position '{}'",
            model.id, model.position_type
        ))
    })
}

pub(crate) fn document_record(
    model: &application_documents::Model,
) -> Result<DocumentRecord, WorkflowError> {
    let document_type = DocumentType::parse(&model.document_type).ok_or_else(|| {
        WorkflowError::Database(format!(
            "document {} has unknown type '{}'",
            model.id, model.document_type
        ))
    })?;
    Ok(DocumentRecord {
        id: model.id,
        document_type,
        verified: model.verified,
        verified_stage: model.verified_stage.as_deref().and_then(Stage::parse),
    })
}

pub(crate) async fn documents_of<C: ConnectionTrait>(
    conn: &C,
    application_id: Uuid,
) -> Result<Vec<application_documents::Model>, WorkflowError> {
    application_documents::Entity::find()
        .filter(application_documents::Column::ApplicationId.eq(application_id))
        .order_by_asc(application_documents::Column::CreatedAt)
        .all(conn)
        .await
        .map_err(db_error)
}

pub(crate) async fn document_records<C: ConnectionTrait>(
    conn: &C,
    application_id: Uuid,
) -> Result<Vec<DocumentRecord>, WorkflowError> {
    documents_of(conn, application_id)
        .await?
        .iter()
        .map(document_record)
        .collect()
}

/// Review row of `stage` in the application's current cycle.
pub(crate) async fn current_review<C: ConnectionTrait>(
    conn: &C,
    application: &applications::Model,
    stage: Stage,
) -> Result<Option<stage_reviews::Model>, WorkflowError> {
    stage_reviews::Entity::find()
        .filter(stage_reviews::Column::ApplicationId.eq(application.id))
        .filter(stage_reviews::Column::Stage.eq(stage.code()))
        .filter(stage_reviews::Column::Cycle.eq(application.cycle))
        .one(conn)
        .await
        .map_err(db_error)
}

pub(crate) fn to_stage_review(row: Option<&stage_reviews::Model>) -> StageReview {
    row.map_or_else(StageReview::default, |r| StageReview {
        officer_id: Some(r.officer_id),
        approved: r.approved,
        rejected: r.rejected,
    })
}
