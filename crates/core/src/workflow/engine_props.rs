//! Property-based tests for StageTransitionEngine.

use proptest::prelude::*;
use uuid::Uuid;

use crate::workflow::engine::StageTransitionEngine;
use crate::workflow::error::WorkflowError;
use crate::workflow::stage::StageConfig;
use crate::workflow::types::{Actor, ApplicationStatus, OfficerRole, Stage};

fn arb_stage() -> impl Strategy<Value = Stage> {
    prop::sample::select(Stage::ALL.to_vec())
}

fn arb_role() -> impl Strategy<Value = OfficerRole> {
    prop::sample::select(OfficerRole::ALL.to_vec())
}

fn arb_status() -> impl Strategy<Value = ApplicationStatus> {
    prop_oneof![
        Just(ApplicationStatus::Draft),
        Just(ApplicationStatus::Completed),
        arb_stage().prop_map(ApplicationStatus::Pending),
        arb_stage()
            .prop_filter("officer stages only", |s| StageConfig::of(*s).is_officer_stage())
            .prop_map(ApplicationStatus::Rejected),
    ]
}

fn arb_uuid() -> impl Strategy<Value = Uuid> {
    any::<u128>().prop_map(Uuid::from_u128)
}

fn arb_comments() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,60}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Whatever an officer attempts, the result is either refused or a lifecycle transition.
    #[test]
    fn prop_officer_actions_never_skip_stages(
        status in arb_status(),
        role in arb_role(),
        officer_id in arb_uuid(),
        assigned_matches in any::<bool>(),
        reject in any::<bool>(),
        comments in arb_comments(),
    ) {
        let actor = Actor::officer(officer_id, role);
        let assigned = if assigned_matches { Some(officer_id) } else { None };

        let result = if reject {
            StageTransitionEngine::reject(status, &actor, assigned, comments)
        } else {
            StageTransitionEngine::approve(status, &actor, assigned, Some(comments))
        };

        if let Ok(action) = result {
            prop_assert!(StageTransitionEngine::is_valid_transition(status, action.new_status()));
            prop_assert_eq!(action.from_status(), status);
            prop_assert_eq!(action.performed_by(), officer_id);
        }
    }

    /// Only the role configured for the stage, acting as the assigned officer, succeeds.
    #[test]
    fn prop_only_configured_role_may_approve(
        stage in arb_stage(),
        role in arb_role(),
        officer_id in arb_uuid(),
    ) {
        let actor = Actor::officer(officer_id, role);
        let result = StageTransitionEngine::approve(
            ApplicationStatus::Pending(stage),
            &actor,
            Some(officer_id),
            None,
        );
        let config = StageConfig::of(stage);

        match config.role {
            Some(required) if required == role => prop_assert!(result.is_ok()),
            Some(_) => prop_assert!(matches!(result, Err(WorkflowError::Unauthorized(_)))),
            None => prop_assert!(matches!(result, Err(WorkflowError::InvalidStageAction { .. })), "expected InvalidStageAction, got {:?}", result),
        }
    }

    /// Approving the configured chain from JE reaches Completed in exactly the table's length.
    #[test]
    fn prop_full_chain_visits_every_stage(officer_id in arb_uuid()) {
        let mut status = ApplicationStatus::Pending(StageConfig::first());
        let mut visited = vec![];

        while let ApplicationStatus::Pending(stage) = status {
            visited.push(stage);
            let action = match StageConfig::of(stage).role {
                Some(role) => StageTransitionEngine::approve(
                    status,
                    &Actor::officer(officer_id, role),
                    Some(officer_id),
                    None,
                ),
                None => StageTransitionEngine::confirm_payment(
                    status,
                    &Actor::system(),
                    "TXN".to_string(),
                ),
            };
            prop_assert!(action.is_ok());
            if let Ok(action) = action {
                status = action.new_status();
            }
        }

        prop_assert_eq!(status, ApplicationStatus::Completed);
        prop_assert_eq!(visited, Stage::ALL.to_vec());
    }

    /// Rejection keeps the stage and always needs non-blank comments.
    #[test]
    fn prop_reject_lands_on_same_stage(
        stage in arb_stage().prop_filter("officer stages", |s| StageConfig::of(*s).is_officer_stage()),
        officer_id in arb_uuid(),
        comments in arb_comments(),
    ) {
        let Some(role) = StageConfig::of(stage).role else {
            return Ok(());
        };
        let actor = Actor::officer(officer_id, role);
        let result = StageTransitionEngine::reject(
            ApplicationStatus::Pending(stage),
            &actor,
            Some(officer_id),
            comments.clone(),
        );

        if comments.trim().is_empty() {
            prop_assert!(matches!(result, Err(WorkflowError::RejectionReasonRequired)));
        } else {
            let action = result.map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert_eq!(action.new_status(), ApplicationStatus::Rejected(stage));
            prop_assert!(action.new_status().is_editable());
        }
    }

    /// Submission always restarts at JE with the next cycle, and only from editable statuses.
    #[test]
    fn prop_submit_restarts_at_junior_engineer(
        status in arb_status(),
        cycle in 0i32..1_000,
        owner in arb_uuid(),
    ) {
        let result = StageTransitionEngine::submit(status, cycle, owner, &Actor::applicant(owner));

        if status.is_editable() {
            let action = result.map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert_eq!(action.new_status(), ApplicationStatus::Pending(Stage::JuniorEngineer));
            if let crate::workflow::types::WorkflowAction::Submit { cycle: next, .. } = action {
                prop_assert_eq!(next, cycle + 1);
            }
        } else {
            let is_invalid = matches!(result, Err(WorkflowError::InvalidStageAction { .. }));
            prop_assert!(is_invalid);
        }
    }

    /// Status codes survive a parse round-trip for every reachable status.
    #[test]
    fn prop_status_code_round_trip(status in arb_status()) {
        prop_assert_eq!(ApplicationStatus::parse(status.as_str()), Some(status));
    }
}
