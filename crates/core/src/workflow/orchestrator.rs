//! Generic per-stage orchestrator.
//!
//! One orchestrator serves every officer stage. It sequences
//! verification → signature → transition using the stage table, and tells
//! the caller which follow-ups (render, assign, request payment, issue
//! certificate) the resulting status needs.

use uuid::Uuid;

use crate::verification::{DocumentRecord, DocumentType, VerificationPolicy};
use crate::workflow::engine::StageTransitionEngine;
use crate::workflow::error::WorkflowError;
use crate::workflow::stage::StageConfig;
use crate::workflow::types::{
    Actor, ApplicationStatus, OfficerRole, Stage, WorkflowAction,
};

/// Progress of a single stage within the current cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageState {
    /// No officer assigned yet.
    AwaitingAssignment,
    /// Officer assigned; documents still under review.
    AwaitingVerification,
    /// Documents verified; waiting for the OTP-backed signature.
    AwaitingSignature,
    /// Signed and forwarded.
    Completed,
    /// Returned to the applicant.
    Rejected,
}

/// Review row of one stage, as persisted.
#[derive(Debug, Clone, Copy, Default)]
pub struct StageReview {
    /// Assigned officer.
    pub officer_id: Option<Uuid>,
    /// Stage signed off.
    pub approved: bool,
    /// Stage rejected.
    pub rejected: bool,
}

/// Work the caller must do after a transition is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUp {
    /// Render the generated document the new stage signs.
    RenderDocument(DocumentType),
    /// Assign an officer to the new stage.
    AssignOfficer {
        /// Stage to staff.
        stage: Stage,
        /// Required role.
        role: OfficerRole,
    },
    /// Create the pending payment.
    RequestPayment,
    /// Issue the certificate number.
    IssueCertificate,
}

/// Result of an orchestrated step.
#[derive(Debug, Clone)]
pub struct StageOutcome {
    /// Transition to persist with its history row.
    pub action: WorkflowAction,
    /// Follow-ups in execution order.
    pub follow_ups: Vec<FollowUp>,
}

/// What a signature at the current stage involves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignaturePlan {
    /// Stage being signed.
    pub stage: Stage,
    /// Signing role, used for the key label and coordinates.
    pub role: OfficerRole,
    /// Document to sign.
    pub document: DocumentType,
}

/// Stateless orchestrator over the stage table.
pub struct WorkflowOrchestrator;

impl WorkflowOrchestrator {
    /// Derives the state of `config`'s stage from its review row and documents.
    #[must_use]
    pub fn stage_state(
        config: &StageConfig,
        review: Option<&StageReview>,
        documents: &[DocumentRecord],
    ) -> StageState {
        let Some(review) = review else {
            return StageState::AwaitingAssignment;
        };
        if review.rejected {
            return StageState::Rejected;
        }
        if review.approved {
            return StageState::Completed;
        }
        if review.officer_id.is_none() {
            return StageState::AwaitingAssignment;
        }
        if VerificationPolicy::ensure_verified(config, documents).is_ok() {
            StageState::AwaitingSignature
        } else {
            StageState::AwaitingVerification
        }
    }

    /// Follow-ups needed when an application lands in `status`.
    #[must_use]
    pub fn entry_follow_ups(status: ApplicationStatus) -> Vec<FollowUp> {
        match status {
            ApplicationStatus::Pending(stage) => {
                let config = StageConfig::of(stage);
                let mut follow_ups = Vec::with_capacity(2);
                if let Some(document) = config.renders_on_entry {
                    follow_ups.push(FollowUp::RenderDocument(document));
                }
                match config.role {
                    Some(role) => follow_ups.push(FollowUp::AssignOfficer { stage, role }),
                    None => follow_ups.push(FollowUp::RequestPayment),
                }
                follow_ups
            }
            ApplicationStatus::Completed => vec![FollowUp::IssueCertificate],
            ApplicationStatus::Draft | ApplicationStatus::Rejected(_) => Vec::new(),
        }
    }

    /// Submits an application that has something to review.
    ///
    /// # Errors
    ///
    /// * `Validation` if no reviewable document is attached
    /// * see [`StageTransitionEngine::submit`]
    pub fn submit(
        status: ApplicationStatus,
        cycle: i32,
        owner_id: Uuid,
        actor: &Actor,
        documents: &[DocumentRecord],
    ) -> Result<StageOutcome, WorkflowError> {
        let action = StageTransitionEngine::submit(status, cycle, owner_id, actor)?;
        VerificationPolicy::ensure_submittable(documents)?;
        Ok(Self::outcome(action))
    }

    /// Checks that the officer may sign now and says what gets signed.
    ///
    /// Used both before an OTP is issued and before it is consumed.
    ///
    /// # Errors
    ///
    /// * `InvalidStageAction` if the stage was already decided
    /// * `DocumentNotVerified` if verification is incomplete
    /// * see [`StageTransitionEngine::authorize`]
    pub fn prepare_signature(
        status: ApplicationStatus,
        actor: &Actor,
        review: &StageReview,
        documents: &[DocumentRecord],
    ) -> Result<SignaturePlan, WorkflowError> {
        let config = StageTransitionEngine::authorize(status, actor, review.officer_id, "sign")?;
        if review.approved || review.rejected {
            return Err(WorkflowError::invalid(status, "sign"));
        }

        VerificationPolicy::ensure_verified(config, documents)?;

        let (Some(role), Some(document)) = (config.role, config.signs) else {
            return Err(WorkflowError::invalid(status, "sign"));
        };

        Ok(SignaturePlan {
            stage: config.stage,
            role,
            document,
        })
    }

    /// Completes the stage after the signature was applied.
    ///
    /// # Errors
    ///
    /// See [`StageTransitionEngine::approve`].
    pub fn complete_signature(
        status: ApplicationStatus,
        actor: &Actor,
        review: &StageReview,
        remarks: Option<String>,
    ) -> Result<StageOutcome, WorkflowError> {
        let action = StageTransitionEngine::approve(status, actor, review.officer_id, remarks)?;
        Ok(Self::outcome(action))
    }

    /// Rejects from any undecided state of the current stage.
    ///
    /// # Errors
    ///
    /// See [`StageTransitionEngine::reject`].
    pub fn reject(
        status: ApplicationStatus,
        actor: &Actor,
        review: &StageReview,
        comments: String,
    ) -> Result<StageOutcome, WorkflowError> {
        if review.approved || review.rejected {
            return Err(WorkflowError::invalid(status, "reject"));
        }
        let action = StageTransitionEngine::reject(status, actor, review.officer_id, comments)?;
        Ok(Self::outcome(action))
    }

    /// Advances past payment.
    ///
    /// # Errors
    ///
    /// See [`StageTransitionEngine::confirm_payment`].
    pub fn confirm_payment(
        status: ApplicationStatus,
        transaction_ref: String,
    ) -> Result<StageOutcome, WorkflowError> {
        let action =
            StageTransitionEngine::confirm_payment(status, &Actor::system(), transaction_ref)?;
        Ok(Self::outcome(action))
    }

    fn outcome(action: WorkflowAction) -> StageOutcome {
        let follow_ups = Self::entry_follow_ups(action.new_status());
        StageOutcome { action, follow_ups }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verified_docs() -> Vec<DocumentRecord> {
        vec![DocumentRecord {
            id: Uuid::new_v4(),
            document_type: DocumentType::IdentityProof,
            verified: true,
            verified_stage: Some(Stage::JuniorEngineer),
        }]
    }

    fn assigned(officer: &Actor) -> StageReview {
        StageReview {
            officer_id: Some(officer.id),
            ..StageReview::default()
        }
    }

    #[test]
    fn test_stage_state_progression() {
        let config = StageConfig::of(Stage::JuniorEngineer);
        let officer = Actor::officer(Uuid::new_v4(), OfficerRole::JuniorEngineer);
        let mut docs = verified_docs();
        docs[0].verified = false;

        assert_eq!(
            WorkflowOrchestrator::stage_state(config, None, &docs),
            StageState::AwaitingAssignment
        );
        let review = assigned(&officer);
        assert_eq!(
            WorkflowOrchestrator::stage_state(config, Some(&review), &docs),
            StageState::AwaitingVerification
        );
        docs[0].verified = true;
        assert_eq!(
            WorkflowOrchestrator::stage_state(config, Some(&review), &docs),
            StageState::AwaitingSignature
        );
        let done = StageReview {
            approved: true,
            ..review
        };
        assert_eq!(
            WorkflowOrchestrator::stage_state(config, Some(&done), &docs),
            StageState::Completed
        );
        let rejected = StageReview {
            rejected: true,
            ..review
        };
        assert_eq!(
            WorkflowOrchestrator::stage_state(config, Some(&rejected), &docs),
            StageState::Rejected
        );
    }

    #[test]
    fn test_submit_follow_ups_render_form_and_assign_je() {
        let owner = Uuid::new_v4();
        let outcome = WorkflowOrchestrator::submit(
            ApplicationStatus::Draft,
            0,
            owner,
            &Actor::applicant(owner),
            &verified_docs(),
        )
        .unwrap();

        assert_eq!(
            outcome.follow_ups,
            vec![
                FollowUp::RenderDocument(DocumentType::RecommendationForm),
                FollowUp::AssignOfficer {
                    stage: Stage::JuniorEngineer,
                    role: OfficerRole::JuniorEngineer
                },
            ]
        );
    }

    #[test]
    fn test_submit_without_documents() {
        let owner = Uuid::new_v4();
        let result = WorkflowOrchestrator::submit(
            ApplicationStatus::Draft,
            0,
            owner,
            &Actor::applicant(owner),
            &[],
        );
        assert!(matches!(result, Err(WorkflowError::Validation(_))));
    }

    #[test]
    fn test_prepare_signature_requires_verification() {
        let je = Actor::officer(Uuid::new_v4(), OfficerRole::JuniorEngineer);
        let mut docs = verified_docs();
        docs[0].verified = false;

        let result = WorkflowOrchestrator::prepare_signature(
            ApplicationStatus::Pending(Stage::JuniorEngineer),
            &je,
            &assigned(&je),
            &docs,
        );
        assert!(matches!(result, Err(WorkflowError::DocumentNotVerified(_))));
    }

    #[test]
    fn test_prepare_signature_plan() {
        let clerk = Actor::officer(Uuid::new_v4(), OfficerRole::Clerk);
        let plan = WorkflowOrchestrator::prepare_signature(
            ApplicationStatus::Pending(Stage::Clerk),
            &clerk,
            &assigned(&clerk),
            &verified_docs(),
        )
        .unwrap();
        assert_eq!(plan.document, DocumentType::PaymentChallan);
        assert_eq!(plan.role, OfficerRole::Clerk);
    }

    #[test]
    fn test_city_engineer_first_round_requests_payment() {
        let ce = Actor::officer(Uuid::new_v4(), OfficerRole::CityEngineer);
        let outcome = WorkflowOrchestrator::complete_signature(
            ApplicationStatus::Pending(Stage::CityEngineerStage1),
            &ce,
            &assigned(&ce),
            None,
        )
        .unwrap();
        assert_eq!(
            outcome.action.new_status(),
            ApplicationStatus::Pending(Stage::Payment)
        );
        assert_eq!(outcome.follow_ups, vec![FollowUp::RequestPayment]);
    }

    #[test]
    fn test_final_signature_issues_certificate_without_assignment() {
        let ce = Actor::officer(Uuid::new_v4(), OfficerRole::CityEngineer);
        let outcome = WorkflowOrchestrator::complete_signature(
            ApplicationStatus::Pending(Stage::CityEngineerStage2),
            &ce,
            &assigned(&ce),
            None,
        )
        .unwrap();
        assert_eq!(outcome.action.new_status(), ApplicationStatus::Completed);
        assert_eq!(outcome.follow_ups, vec![FollowUp::IssueCertificate]);
    }

    #[test]
    fn test_payment_confirmation_renders_challan_and_assigns_clerk() {
        let outcome = WorkflowOrchestrator::confirm_payment(
            ApplicationStatus::Pending(Stage::Payment),
            "TXN-1".to_string(),
        )
        .unwrap();
        assert_eq!(
            outcome.follow_ups,
            vec![
                FollowUp::RenderDocument(DocumentType::PaymentChallan),
                FollowUp::AssignOfficer {
                    stage: Stage::Clerk,
                    role: OfficerRole::Clerk
                },
            ]
        );
    }

    #[test]
    fn test_reject_has_no_follow_ups() {
        let ae = Actor::officer(Uuid::new_v4(), OfficerRole::AssistantEngineer);
        let outcome = WorkflowOrchestrator::reject(
            ApplicationStatus::Pending(Stage::AssistantEngineer),
            &ae,
            &assigned(&ae),
            "Experience letter unsigned".to_string(),
        )
        .unwrap();
        assert!(outcome.follow_ups.is_empty());
    }

    #[test]
    fn test_decided_stage_cannot_be_rejected() {
        let ae = Actor::officer(Uuid::new_v4(), OfficerRole::AssistantEngineer);
        let review = StageReview {
            approved: true,
            ..assigned(&ae)
        };
        let result = WorkflowOrchestrator::reject(
            ApplicationStatus::Pending(Stage::AssistantEngineer),
            &ae,
            &review,
            "late".to_string(),
        );
        assert!(matches!(
            result,
            Err(WorkflowError::InvalidStageAction { .. })
        ));
    }
}
