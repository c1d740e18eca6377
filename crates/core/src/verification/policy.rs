//! Document verification policy.
//!
//! At least one uploaded (non-generated) document must exist and all of them
//! must be verified before an officer may request a signature. Stages flagged
//! `requires_own_verification` only accept verifications made at that stage.

use chrono::Utc;

use crate::verification::types::{DocumentRecord, DocumentType, VerificationDecision};
use crate::workflow::engine::StageTransitionEngine;
use crate::workflow::error::WorkflowError;
use crate::workflow::stage::StageConfig;
use crate::workflow::types::{Actor, ActorKind, ApplicationStatus};

/// Stateless checks around document review.
pub struct VerificationPolicy;

impl VerificationPolicy {
    /// Returns the reviewable documents still blocking a signature at `config`.
    #[must_use]
    pub fn outstanding<'a>(
        config: &StageConfig,
        documents: &'a [DocumentRecord],
    ) -> Vec<&'a DocumentRecord> {
        documents
            .iter()
            .filter(|doc| !doc.document_type.is_generated())
            .filter(|doc| {
                !doc.verified
                    || (config.requires_own_verification
                        && doc.verified_stage != Some(config.stage))
            })
            .collect()
    }

    /// Ensures every reviewable document is verified for `config`.
    ///
    /// # Errors
    ///
    /// Returns `DocumentNotVerified` naming the outstanding documents, or when
    /// no reviewable document exists at all.
    pub fn ensure_verified(
        config: &StageConfig,
        documents: &[DocumentRecord],
    ) -> Result<(), WorkflowError> {
        if !documents.iter().any(|d| !d.document_type.is_generated()) {
            return Err(WorkflowError::DocumentNotVerified(
                "no reviewable documents attached".to_string(),
            ));
        }

        let outstanding = Self::outstanding(config, documents);
        if outstanding.is_empty() {
            return Ok(());
        }

        let names: Vec<&str> = outstanding
            .iter()
            .map(|d| d.document_type.as_str())
            .collect();
        Err(WorkflowError::DocumentNotVerified(format!(
            "{} pending at stage {}: {}",
            outstanding.len(),
            config.stage,
            names.join(", ")
        )))
    }

    /// Ensures the applicant may attach a document of this type now.
    ///
    /// # Errors
    ///
    /// * `Unauthorized` if the actor is not the owning applicant
    /// * `InvalidStageAction` if the application is not editable
    /// * `Validation` for generated document types
    pub fn ensure_attachable(
        status: ApplicationStatus,
        owner_id: uuid::Uuid,
        actor: &Actor,
        document_type: DocumentType,
    ) -> Result<(), WorkflowError> {
        if actor.kind != ActorKind::Applicant || actor.id != owner_id {
            return Err(WorkflowError::Unauthorized(
                "only the owning applicant may attach documents".to_string(),
            ));
        }
        if !status.is_editable() {
            return Err(WorkflowError::invalid(status, "attach documents"));
        }
        if document_type.is_generated() {
            return Err(WorkflowError::Validation(format!(
                "{document_type} is generated by the system"
            )));
        }
        Ok(())
    }

    /// Ensures an application has something to review before submission.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when no reviewable document is attached.
    pub fn ensure_submittable(documents: &[DocumentRecord]) -> Result<(), WorkflowError> {
        if documents.iter().any(|d| !d.document_type.is_generated()) {
            Ok(())
        } else {
            Err(WorkflowError::Validation(
                "attach at least one document before submitting".to_string(),
            ))
        }
    }

    /// Records an officer's review of one document.
    ///
    /// Does not advance the stage.
    ///
    /// # Errors
    ///
    /// * `Validation` for generated documents
    /// * see [`StageTransitionEngine::authorize`]
    pub fn review(
        status: ApplicationStatus,
        actor: &Actor,
        assigned_officer: Option<uuid::Uuid>,
        document: &DocumentRecord,
        approved: bool,
        remarks: Option<String>,
    ) -> Result<VerificationDecision, WorkflowError> {
        let config =
            StageTransitionEngine::authorize(status, actor, assigned_officer, "verify documents")?;

        if document.document_type.is_generated() {
            return Err(WorkflowError::Validation(format!(
                "{} is generated and not reviewed",
                document.document_type
            )));
        }

        Ok(VerificationDecision {
            verified: approved,
            verified_by: actor.id,
            verified_stage: config.stage,
            verified_at: Utc::now(),
            remarks: remarks.filter(|r| !r.trim().is_empty()),
        })
    }
}
