//! Application workflow management for Permitflow.
//!
//! This module implements the application lifecycle state machine, the
//! static stage table that drives it, and the generic orchestrator that
//! sequences verification, signature and transition for every officer.
//!
//! # Modules
//!
//! - `types` - Workflow domain types (ApplicationStatus, Stage, WorkflowAction)
//! - `stage` - Stage-configuration table
//! - `engine` - Status transition rules
//! - `orchestrator` - Per-stage sequencing and follow-ups
//! - `events` - Notification-trigger events
//! - `error` - Workflow error taxonomy

pub mod engine;
pub mod error;
pub mod events;
pub mod orchestrator;
pub mod stage;
pub mod types;

#[cfg(test)]
mod engine_props;

pub use engine::StageTransitionEngine;
pub use error::WorkflowError;
pub use events::WorkflowEvent;
pub use orchestrator::{
    FollowUp, SignaturePlan, StageOutcome, StageReview, StageState, WorkflowOrchestrator,
};
pub use stage::StageConfig;
pub use types::{
    Actor, ActorKind, ApplicationStatus, OfficerRole, PositionType, Stage, WorkflowAction,
};
