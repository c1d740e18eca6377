//! Stage transition engine.
//!
//! Pure state machine: given the current status, the acting party and the
//! assigned officer, it either returns the `WorkflowAction` to persist or
//! the reason the action is refused. It never touches storage.

use chrono::Utc;
use uuid::Uuid;

use crate::workflow::error::WorkflowError;
use crate::workflow::stage::StageConfig;
use crate::workflow::types::{Actor, ActorKind, ApplicationStatus, Stage, WorkflowAction};

/// Stateless engine for application status transitions.
pub struct StageTransitionEngine;

impl StageTransitionEngine {
    /// Submit a draft or rejected application, opening a new cycle at JE.
    ///
    /// # Errors
    ///
    /// * `Unauthorized` if the actor is not the owning applicant
    /// * `InvalidStageAction` if the application is not editable
    pub fn submit(
        current_status: ApplicationStatus,
        current_cycle: i32,
        owner_id: Uuid,
        actor: &Actor,
    ) -> Result<WorkflowAction, WorkflowError> {
        if actor.kind != ActorKind::Applicant || actor.id != owner_id {
            return Err(WorkflowError::Unauthorized(
                "only the owning applicant may submit".to_string(),
            ));
        }

        if !current_status.is_editable() {
            return Err(WorkflowError::invalid(current_status, "submit"));
        }

        Ok(WorkflowAction::Submit {
            from: current_status,
            new_status: ApplicationStatus::Pending(StageConfig::first()),
            cycle: current_cycle + 1,
            submitted_by: actor.id,
            submitted_at: Utc::now(),
        })
    }

    /// Checks that `actor` may act on the stage the application waits at.
    ///
    /// # Errors
    ///
    /// * `InvalidStageAction` if nothing is pending or the stage has no officer
    /// * `Unauthorized` if the role or the assignment does not match
    pub fn authorize(
        current_status: ApplicationStatus,
        actor: &Actor,
        assigned_officer: Option<Uuid>,
        action: &'static str,
    ) -> Result<&'static StageConfig, WorkflowError> {
        let stage = current_status
            .pending_stage()
            .ok_or_else(|| WorkflowError::invalid(current_status, action))?;
        let config = StageConfig::of(stage);

        let Some(required_role) = config.role else {
            return Err(WorkflowError::invalid(current_status, action));
        };

        match actor.officer_role() {
            Some(role) if role == required_role => {}
            _ => {
                return Err(WorkflowError::Unauthorized(format!(
                    "stage {stage} requires a {required_role}"
                )));
            }
        }

        if assigned_officer != Some(actor.id) {
            return Err(WorkflowError::Unauthorized(format!(
                "officer {} is not assigned to stage {stage}",
                actor.id
            )));
        }

        Ok(config)
    }

    /// Approve the current stage and advance to its successor.
    ///
    /// The final stage advances to `Completed`.
    ///
    /// # Errors
    ///
    /// See [`Self::authorize`].
    pub fn approve(
        current_status: ApplicationStatus,
        actor: &Actor,
        assigned_officer: Option<Uuid>,
        remarks: Option<String>,
    ) -> Result<WorkflowAction, WorkflowError> {
        let config = Self::authorize(current_status, actor, assigned_officer, "approve")?;

        let new_status = config
            .successor
            .map_or(ApplicationStatus::Completed, ApplicationStatus::Pending);

        Ok(WorkflowAction::Approve {
            stage: config.stage,
            new_status,
            approved_by: actor.id,
            approved_at: Utc::now(),
            remarks: remarks.filter(|r| !r.trim().is_empty()),
        })
    }

    /// Reject at the current stage, returning the application to the applicant.
    ///
    /// # Errors
    ///
    /// * `RejectionReasonRequired` if `comments` is blank
    /// * see [`Self::authorize`]
    pub fn reject(
        current_status: ApplicationStatus,
        actor: &Actor,
        assigned_officer: Option<Uuid>,
        comments: String,
    ) -> Result<WorkflowAction, WorkflowError> {
        if comments.trim().is_empty() {
            return Err(WorkflowError::RejectionReasonRequired);
        }

        let config = Self::authorize(current_status, actor, assigned_officer, "reject")?;

        Ok(WorkflowAction::Reject {
            stage: config.stage,
            new_status: ApplicationStatus::Rejected(config.stage),
            rejected_by: actor.id,
            rejected_at: Utc::now(),
            comments: comments.trim().to_string(),
        })
    }

    /// Advance past the payment stage after a confirmed gateway callback.
    ///
    /// # Errors
    ///
    /// * `Unauthorized` unless the actor is the system
    /// * `InvalidStageAction` unless the application waits at payment
    pub fn confirm_payment(
        current_status: ApplicationStatus,
        actor: &Actor,
        transaction_ref: String,
    ) -> Result<WorkflowAction, WorkflowError> {
        if actor.kind != ActorKind::System {
            return Err(WorkflowError::Unauthorized(
                "payment is confirmed only by the gateway callback".to_string(),
            ));
        }

        if current_status != ApplicationStatus::Pending(Stage::Payment) {
            return Err(WorkflowError::invalid(current_status, "confirm payment"));
        }

        let next = StageConfig::of(Stage::Payment)
            .successor
            .map_or(ApplicationStatus::Completed, ApplicationStatus::Pending);

        Ok(WorkflowAction::ConfirmPayment {
            new_status: next,
            transaction_ref,
            confirmed_at: Utc::now(),
        })
    }

    /// Check if a status transition is part of the lifecycle.
    ///
    /// Valid transitions:
    /// - Draft / Rejected(_) → Pending(JE) (submit)
    /// - Pending(s) → Pending(successor of s), or Completed after the last stage
    /// - Pending(s) → Rejected(s) for officer stages
    #[must_use]
    pub fn is_valid_transition(from: ApplicationStatus, to: ApplicationStatus) -> bool {
        match (from, to) {
            (ApplicationStatus::Draft | ApplicationStatus::Rejected(_), ApplicationStatus::Pending(s)) => {
                s == StageConfig::first()
            }
            (ApplicationStatus::Pending(s), ApplicationStatus::Pending(next)) => {
                StageConfig::of(s).successor == Some(next)
            }
            (ApplicationStatus::Pending(s), ApplicationStatus::Completed) => {
                StageConfig::of(s).successor.is_none()
            }
            (ApplicationStatus::Pending(s), ApplicationStatus::Rejected(r)) => {
                s == r && StageConfig::of(s).is_officer_stage()
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::types::OfficerRole;

    fn officer(role: OfficerRole) -> Actor {
        Actor::officer(Uuid::new_v4(), role)
    }

    #[test]
    fn test_submit_from_draft() {
        let owner = Uuid::new_v4();
        let action = StageTransitionEngine::submit(
            ApplicationStatus::Draft,
            0,
            owner,
            &Actor::applicant(owner),
        )
        .unwrap();

        assert_eq!(
            action.new_status(),
            ApplicationStatus::Pending(Stage::JuniorEngineer)
        );
        let WorkflowAction::Submit { cycle, from, .. } = action else {
            panic!("expected submit");
        };
        assert_eq!(cycle, 1);
        assert_eq!(from, ApplicationStatus::Draft);
    }

    #[test]
    fn test_resubmit_after_rejection_opens_new_cycle() {
        let owner = Uuid::new_v4();
        let action = StageTransitionEngine::submit(
            ApplicationStatus::Rejected(Stage::AssistantEngineer),
            1,
            owner,
            &Actor::applicant(owner),
        )
        .unwrap();
        let WorkflowAction::Submit { cycle, .. } = action else {
            panic!("expected submit");
        };
        assert_eq!(cycle, 2);
    }

    #[test]
    fn test_submit_by_other_applicant_is_refused() {
        let result = StageTransitionEngine::submit(
            ApplicationStatus::Draft,
            0,
            Uuid::new_v4(),
            &Actor::applicant(Uuid::new_v4()),
        );
        assert!(matches!(result, Err(WorkflowError::Unauthorized(_))));
    }

    #[test]
    fn test_submit_while_pending_is_refused() {
        let owner = Uuid::new_v4();
        let result = StageTransitionEngine::submit(
            ApplicationStatus::Pending(Stage::AssistantEngineer),
            1,
            owner,
            &Actor::applicant(owner),
        );
        assert!(matches!(
            result,
            Err(WorkflowError::InvalidStageAction { .. })
        ));
    }

    #[test]
    fn test_approve_advances_to_successor() {
        let ae = officer(OfficerRole::AssistantEngineer);
        let action = StageTransitionEngine::approve(
            ApplicationStatus::Pending(Stage::AssistantEngineer),
            &ae,
            Some(ae.id),
            None,
        )
        .unwrap();
        assert_eq!(
            action.new_status(),
            ApplicationStatus::Pending(Stage::ExecutiveEngineerStage1)
        );
        assert_eq!(action.performed_by(), ae.id);
    }

    #[test]
    fn test_approve_final_stage_completes() {
        let ce = officer(OfficerRole::CityEngineer);
        let action = StageTransitionEngine::approve(
            ApplicationStatus::Pending(Stage::CityEngineerStage2),
            &ce,
            Some(ce.id),
            Some("Certificate approved".to_string()),
        )
        .unwrap();
        assert_eq!(action.new_status(), ApplicationStatus::Completed);
    }

    #[test]
    fn test_approve_wrong_role_is_unauthorized() {
        let je = officer(OfficerRole::JuniorEngineer);
        let result = StageTransitionEngine::approve(
            ApplicationStatus::Pending(Stage::AssistantEngineer),
            &je,
            Some(je.id),
            None,
        );
        assert!(matches!(result, Err(WorkflowError::Unauthorized(_))));
    }

    #[test]
    fn test_approve_unassigned_officer_is_unauthorized() {
        let ae = officer(OfficerRole::AssistantEngineer);
        let result = StageTransitionEngine::approve(
            ApplicationStatus::Pending(Stage::AssistantEngineer),
            &ae,
            Some(Uuid::new_v4()),
            None,
        );
        assert!(matches!(result, Err(WorkflowError::Unauthorized(_))));
    }

    #[test]
    fn test_executive_engineer_acts_in_both_rounds() {
        let ee = officer(OfficerRole::ExecutiveEngineer);
        for stage in [Stage::ExecutiveEngineerStage1, Stage::ExecutiveEngineerStage2] {
            assert!(
                StageTransitionEngine::approve(
                    ApplicationStatus::Pending(stage),
                    &ee,
                    Some(ee.id),
                    None
                )
                .is_ok()
            );
        }
    }

    #[test]
    fn test_officers_cannot_act_on_payment_stage() {
        let clerk = officer(OfficerRole::Clerk);
        let result = StageTransitionEngine::approve(
            ApplicationStatus::Pending(Stage::Payment),
            &clerk,
            Some(clerk.id),
            None,
        );
        assert!(matches!(
            result,
            Err(WorkflowError::InvalidStageAction { .. })
        ));
    }

    #[test]
    fn test_acting_on_completed_is_invalid() {
        let ce = officer(OfficerRole::CityEngineer);
        let result =
            StageTransitionEngine::approve(ApplicationStatus::Completed, &ce, Some(ce.id), None);
        assert!(matches!(
            result,
            Err(WorkflowError::InvalidStageAction { .. })
        ));
    }

    #[test]
    fn test_reject_requires_comments() {
        let je = officer(OfficerRole::JuniorEngineer);
        let result = StageTransitionEngine::reject(
            ApplicationStatus::Pending(Stage::JuniorEngineer),
            &je,
            Some(je.id),
            "   ".to_string(),
        );
        assert!(matches!(
            result,
            Err(WorkflowError::RejectionReasonRequired)
        ));
    }

    #[test]
    fn test_reject_routes_back_to_applicant() {
        let je = officer(OfficerRole::JuniorEngineer);
        let action = StageTransitionEngine::reject(
            ApplicationStatus::Pending(Stage::JuniorEngineer),
            &je,
            Some(je.id),
            "  Address proof illegible ".to_string(),
        )
        .unwrap();
        assert_eq!(
            action.new_status(),
            ApplicationStatus::Rejected(Stage::JuniorEngineer)
        );
        assert!(action.new_status().is_editable());
        assert_eq!(action.remarks().as_deref(), Some("Address proof illegible"));
    }

    #[test]
    fn test_confirm_payment_only_by_system() {
        let clerk = officer(OfficerRole::Clerk);
        let pending = ApplicationStatus::Pending(Stage::Payment);

        assert!(matches!(
            StageTransitionEngine::confirm_payment(pending, &clerk, "T1".to_string()),
            Err(WorkflowError::Unauthorized(_))
        ));

        let action =
            StageTransitionEngine::confirm_payment(pending, &Actor::system(), "T1".to_string())
                .unwrap();
        assert_eq!(action.new_status(), ApplicationStatus::Pending(Stage::Clerk));
    }

    #[test]
    fn test_confirm_payment_outside_payment_stage() {
        let result = StageTransitionEngine::confirm_payment(
            ApplicationStatus::Pending(Stage::Clerk),
            &Actor::system(),
            "T1".to_string(),
        );
        assert!(matches!(
            result,
            Err(WorkflowError::InvalidStageAction { .. })
        ));
    }

    #[test]
    fn test_is_valid_transition() {
        use ApplicationStatus::{Completed, Draft, Pending, Rejected};

        assert!(StageTransitionEngine::is_valid_transition(
            Draft,
            Pending(Stage::JuniorEngineer)
        ));
        assert!(StageTransitionEngine::is_valid_transition(
            Rejected(Stage::Clerk),
            Pending(Stage::JuniorEngineer)
        ));
        assert!(StageTransitionEngine::is_valid_transition(
            Pending(Stage::CityEngineerStage1),
            Pending(Stage::Payment)
        ));
        assert!(StageTransitionEngine::is_valid_transition(
            Pending(Stage::CityEngineerStage2),
            Completed
        ));

        assert!(!StageTransitionEngine::is_valid_transition(
            Pending(Stage::JuniorEngineer),
            Pending(Stage::ExecutiveEngineerStage1)
        ));
        assert!(!StageTransitionEngine::is_valid_transition(
            Pending(Stage::Payment),
            Rejected(Stage::Payment)
        ));
        assert!(!StageTransitionEngine::is_valid_transition(
            Completed, Draft
        ));
        assert!(!StageTransitionEngine::is_valid_transition(
            Draft,
            Pending(Stage::AssistantEngineer)
        ));
    }
}
