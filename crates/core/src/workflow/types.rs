//! Workflow domain types for the application lifecycle.
//!
//! Applications move through a fixed sequence of stages:
//! Draft → JE → AE → EE1 → CE1 → Payment → Clerk → EE2 → CE2 → Completed.
//! Any officer stage may reject, which makes the application editable again.

use chrono::{DateTime, Utc};
use permitflow_shared::{ActorRole, Claims};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

use crate::workflow::events::WorkflowEvent;

/// One step of the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    /// Junior Engineer scrutiny.
    JuniorEngineer,
    /// Assistant Engineer review.
    AssistantEngineer,
    /// Executive Engineer, first round.
    ExecutiveEngineerStage1,
    /// City Engineer, first round.
    CityEngineerStage1,
    /// Fee collection; no officer.
    Payment,
    /// Clerk issues the payment challan.
    Clerk,
    /// Executive Engineer, certificate round.
    ExecutiveEngineerStage2,
    /// City Engineer, certificate round.
    CityEngineerStage2,
}

impl Stage {
    /// All stages in lifecycle order.
    pub const ALL: [Self; 8] = [
        Self::JuniorEngineer,
        Self::AssistantEngineer,
        Self::ExecutiveEngineerStage1,
        Self::CityEngineerStage1,
        Self::Payment,
        Self::Clerk,
        Self::ExecutiveEngineerStage2,
        Self::CityEngineerStage2,
    ];

    /// Short code used in status strings and storage.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::JuniorEngineer => "je",
            Self::AssistantEngineer => "ae",
            Self::ExecutiveEngineerStage1 => "ee1",
            Self::CityEngineerStage1 => "ce1",
            Self::Payment => "payment",
            Self::Clerk => "clerk",
            Self::ExecutiveEngineerStage2 => "ee2",
            Self::CityEngineerStage2 => "ce2",
        }
    }

    /// Parses a short code.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|stage| stage.code() == s)
    }

    /// Position of this stage in the lifecycle, starting at 0.
    #[must_use]
    pub const fn ordinal(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for Stage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for Stage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("unknown stage: {raw}")))
    }
}

/// Current status of an application.
///
/// Stored as a single string code, e.g. `ae_pending` or `rejected_by_je`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApplicationStatus {
    /// Being prepared by the applicant.
    Draft,
    /// Waiting at the given stage.
    Pending(Stage),
    /// Certificate issued.
    Completed,
    /// Returned to the applicant by the officer of the given stage; never `Payment`.
    Rejected(Stage),
}

impl ApplicationStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Completed => "completed",
            Self::Pending(stage) => match stage {
                Stage::JuniorEngineer => "je_pending",
                Stage::AssistantEngineer => "ae_pending",
                Stage::ExecutiveEngineerStage1 => "ee1_pending",
                Stage::CityEngineerStage1 => "ce1_pending",
                Stage::Payment => "payment_pending",
                Stage::Clerk => "clerk_pending",
                Stage::ExecutiveEngineerStage2 => "ee2_pending",
                Stage::CityEngineerStage2 => "ce2_pending",
            },
            Self::Rejected(stage) => match stage {
                Stage::JuniorEngineer => "rejected_by_je",
                Stage::AssistantEngineer => "rejected_by_ae",
                Stage::ExecutiveEngineerStage1 => "rejected_by_ee1",
                Stage::CityEngineerStage1 => "rejected_by_ce1",
                Stage::Payment => "rejected_by_payment",
                Stage::Clerk => "rejected_by_clerk",
                Stage::ExecutiveEngineerStage2 => "rejected_by_ee2",
                Stage::CityEngineerStage2 => "rejected_by_ce2",
            },
        }
    }

    /// Parses a status from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => return Some(Self::Draft),
            "completed" => return Some(Self::Completed),
            _ => {}
        }
        if let Some(code) = s.strip_suffix("_pending") {
            return Stage::parse(code).map(Self::Pending);
        }
        // Payment has no officer, so nothing can be rejected there.
        s.strip_prefix("rejected_by_")
            .and_then(Stage::parse)
            .filter(|stage| *stage != Stage::Payment)
            .map(Self::Rejected)
    }

    /// Returns true if the applicant may edit and (re)submit.
    #[must_use]
    pub const fn is_editable(&self) -> bool {
        matches!(self, Self::Draft | Self::Rejected(_))
    }

    /// Returns true once the certificate has been issued.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// The stage the application is currently waiting at.
    #[must_use]
    pub const fn pending_stage(&self) -> Option<Stage> {
        match self {
            Self::Pending(stage) => Some(*stage),
            _ => None,
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ApplicationStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ApplicationStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("unknown status: {raw}")))
    }
}

/// Officer roles that act on applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfficerRole {
    /// Junior Engineer.
    JuniorEngineer,
    /// Assistant Engineer.
    AssistantEngineer,
    /// Executive Engineer (both rounds).
    ExecutiveEngineer,
    /// City Engineer (both rounds).
    CityEngineer,
    /// Clerk.
    Clerk,
}

impl OfficerRole {
    /// All officer roles.
    pub const ALL: [Self; 5] = [
        Self::JuniorEngineer,
        Self::AssistantEngineer,
        Self::ExecutiveEngineer,
        Self::CityEngineer,
        Self::Clerk,
    ];

    /// Returns the string representation of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::JuniorEngineer => "junior_engineer",
            Self::AssistantEngineer => "assistant_engineer",
            Self::ExecutiveEngineer => "executive_engineer",
            Self::CityEngineer => "city_engineer",
            Self::Clerk => "clerk",
        }
    }

    /// Parses a role from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.as_str() == s)
    }

    /// Abbreviation printed on documents and used in key labels.
    #[must_use]
    pub const fn abbreviation(&self) -> &'static str {
        match self {
            Self::JuniorEngineer => "JE",
            Self::AssistantEngineer => "AE",
            Self::ExecutiveEngineer => "EE",
            Self::CityEngineer => "CE",
            Self::Clerk => "CLERK",
        }
    }

    /// Human readable title.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::JuniorEngineer => "Junior Engineer",
            Self::AssistantEngineer => "Assistant Engineer",
            Self::ExecutiveEngineer => "Executive Engineer",
            Self::CityEngineer => "City Engineer",
            Self::Clerk => "Clerk",
        }
    }
}

impl fmt::Display for OfficerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<OfficerRole> for ActorRole {
    fn from(role: OfficerRole) -> Self {
        match role {
            OfficerRole::JuniorEngineer => Self::JuniorEngineer,
            OfficerRole::AssistantEngineer => Self::AssistantEngineer,
            OfficerRole::ExecutiveEngineer => Self::ExecutiveEngineer,
            OfficerRole::CityEngineer => Self::CityEngineer,
            OfficerRole::Clerk => Self::Clerk,
        }
    }
}

/// Professional position the applicant registers for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionType {
    /// Architect.
    Architect,
    /// Licence Engineer.
    LicenceEngineer,
    /// Structural Engineer.
    StructuralEngineer,
    /// Supervisor grade 1.
    Supervisor1,
    /// Supervisor grade 2.
    Supervisor2,
}

impl PositionType {
    /// All position types.
    pub const ALL: [Self; 5] = [
        Self::Architect,
        Self::LicenceEngineer,
        Self::StructuralEngineer,
        Self::Supervisor1,
        Self::Supervisor2,
    ];

    /// Returns the string representation of the position type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Architect => "architect",
            Self::LicenceEngineer => "licence_engineer",
            Self::StructuralEngineer => "structural_engineer",
            Self::Supervisor1 => "supervisor1",
            Self::Supervisor2 => "supervisor2",
        }
    }

    /// Parses a position type from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == s)
    }

    /// Human readable title.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::Architect => "Architect",
            Self::LicenceEngineer => "Licence Engineer",
            Self::StructuralEngineer => "Structural Engineer",
            Self::Supervisor1 => "Supervisor Grade 1",
            Self::Supervisor2 => "Supervisor Grade 2",
        }
    }

    /// Abbreviation used in default key labels.
    #[must_use]
    pub const fn abbreviation(&self) -> &'static str {
        match self {
            Self::Architect => "ARCH",
            Self::LicenceEngineer => "LE",
            Self::StructuralEngineer => "SE",
            Self::Supervisor1 => "SUP1",
            Self::Supervisor2 => "SUP2",
        }
    }
}

impl fmt::Display for PositionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of party is acting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorKind {
    /// The applicant owning the application.
    Applicant,
    /// An officer holding the given role.
    Officer(OfficerRole),
    /// Internal callers such as the payment callback.
    System,
}

/// The party performing a workflow action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// User or officer ID; nil for the system.
    pub id: Uuid,
    /// Acting capacity.
    pub kind: ActorKind,
}

impl Actor {
    /// An applicant.
    #[must_use]
    pub const fn applicant(id: Uuid) -> Self {
        Self {
            id,
            kind: ActorKind::Applicant,
        }
    }

    /// An officer.
    #[must_use]
    pub const fn officer(id: Uuid, role: OfficerRole) -> Self {
        Self {
            id,
            kind: ActorKind::Officer(role),
        }
    }

    /// The system actor.
    #[must_use]
    pub const fn system() -> Self {
        Self {
            id: Uuid::nil(),
            kind: ActorKind::System,
        }
    }

    /// Builds the actor from validated JWT claims.
    #[must_use]
    pub fn from_claims(claims: &Claims) -> Self {
        let id = claims.user_id();
        match claims.role {
            ActorRole::Applicant => Self::applicant(id),
            ActorRole::JuniorEngineer => Self::officer(id, OfficerRole::JuniorEngineer),
            ActorRole::AssistantEngineer => Self::officer(id, OfficerRole::AssistantEngineer),
            ActorRole::ExecutiveEngineer => Self::officer(id, OfficerRole::ExecutiveEngineer),
            ActorRole::CityEngineer => Self::officer(id, OfficerRole::CityEngineer),
            ActorRole::Clerk => Self::officer(id, OfficerRole::Clerk),
        }
    }

    /// The officer role, if this is an officer.
    #[must_use]
    pub const fn officer_role(&self) -> Option<OfficerRole> {
        match self.kind {
            ActorKind::Officer(role) => Some(role),
            _ => None,
        }
    }
}

/// Workflow action representing a status change with audit data.
///
/// Each variant becomes exactly one history row.
#[derive(Debug, Clone)]
pub enum WorkflowAction {
    /// Applicant submits (or resubmits) the application.
    Submit {
        /// Status before submission.
        from: ApplicationStatus,
        /// Status after submission.
        new_status: ApplicationStatus,
        /// Submission round opened by this action.
        cycle: i32,
        /// The applicant.
        submitted_by: Uuid,
        /// When the application was submitted.
        submitted_at: DateTime<Utc>,
    },
    /// Officer signs and forwards the application.
    Approve {
        /// Stage that was completed.
        stage: Stage,
        /// Status after approval.
        new_status: ApplicationStatus,
        /// The officer.
        approved_by: Uuid,
        /// When the stage was completed.
        approved_at: DateTime<Utc>,
        /// Optional officer remarks.
        remarks: Option<String>,
    },
    /// Officer returns the application to the applicant.
    Reject {
        /// Stage that rejected.
        stage: Stage,
        /// Status after rejection.
        new_status: ApplicationStatus,
        /// The officer.
        rejected_by: Uuid,
        /// When it was rejected.
        rejected_at: DateTime<Utc>,
        /// Mandatory comments.
        comments: String,
    },
    /// Payment gateway confirmed the fee.
    ConfirmPayment {
        /// Status after confirmation.
        new_status: ApplicationStatus,
        /// Gateway transaction reference.
        transaction_ref: String,
        /// When the callback was accepted.
        confirmed_at: DateTime<Utc>,
    },
}

impl WorkflowAction {
    /// Returns the new status resulting from this action.
    #[must_use]
    pub const fn new_status(&self) -> ApplicationStatus {
        match self {
            Self::Submit { new_status, .. }
            | Self::Approve { new_status, .. }
            | Self::Reject { new_status, .. }
            | Self::ConfirmPayment { new_status, .. } => *new_status,
        }
    }

    /// Returns the status the action starts from.
    #[must_use]
    pub const fn from_status(&self) -> ApplicationStatus {
        match self {
            Self::Submit { from, .. } => *from,
            Self::Approve { stage, .. } | Self::Reject { stage, .. } => {
                ApplicationStatus::Pending(*stage)
            }
            Self::ConfirmPayment { .. } => ApplicationStatus::Pending(Stage::Payment),
        }
    }

    /// Who performed the action; nil for system actions.
    #[must_use]
    pub const fn performed_by(&self) -> Uuid {
        match self {
            Self::Submit { submitted_by, .. } => *submitted_by,
            Self::Approve { approved_by, .. } => *approved_by,
            Self::Reject { rejected_by, .. } => *rejected_by,
            Self::ConfirmPayment { .. } => Uuid::nil(),
        }
    }

    /// When the action happened.
    #[must_use]
    pub const fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            Self::Submit { submitted_at, .. } => *submitted_at,
            Self::Approve { approved_at, .. } => *approved_at,
            Self::Reject { rejected_at, .. } => *rejected_at,
            Self::ConfirmPayment { confirmed_at, .. } => *confirmed_at,
        }
    }

    /// Remarks recorded in the history row.
    #[must_use]
    pub fn remarks(&self) -> Option<String> {
        match self {
            Self::Submit { cycle, .. } => Some(format!("Submitted (cycle {cycle})")),
            Self::Approve { remarks, .. } => remarks.clone(),
            Self::Reject { comments, .. } => Some(comments.clone()),
            Self::ConfirmPayment {
                transaction_ref, ..
            } => Some(format!("Payment received: {transaction_ref}")),
        }
    }

    /// The notification-trigger event for this action.
    #[must_use]
    pub fn event(&self, application_id: Uuid) -> WorkflowEvent {
        match self {
            Self::Submit { cycle, .. } => WorkflowEvent::ApplicationSubmitted {
                application_id,
                cycle: *cycle,
            },
            Self::Approve {
                stage, approved_by, ..
            } => WorkflowEvent::StageApproved {
                application_id,
                stage: *stage,
                officer_id: *approved_by,
            },
            Self::Reject {
                stage,
                rejected_by,
                comments,
                ..
            } => WorkflowEvent::ApplicationRejected {
                application_id,
                stage: *stage,
                officer_id: *rejected_by,
                comments: comments.clone(),
            },
            Self::ConfirmPayment {
                transaction_ref, ..
            } => WorkflowEvent::PaymentReceived {
                application_id,
                transaction_ref: transaction_ref.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ApplicationStatus::Draft, "draft")]
    #[case(ApplicationStatus::Pending(Stage::JuniorEngineer), "je_pending")]
    #[case(ApplicationStatus::Pending(Stage::Payment), "payment_pending")]
    #[case(ApplicationStatus::Pending(Stage::CityEngineerStage2), "ce2_pending")]
    #[case(ApplicationStatus::Completed, "completed")]
    #[case(ApplicationStatus::Rejected(Stage::JuniorEngineer), "rejected_by_je")]
    #[case(ApplicationStatus::Rejected(Stage::Clerk), "rejected_by_clerk")]
    fn test_status_codes(#[case] status: ApplicationStatus, #[case] code: &str) {
        assert_eq!(status.as_str(), code);
        assert_eq!(ApplicationStatus::parse(code), Some(status));
    }

    #[rstest]
    #[case("pending")]
    #[case("xx_pending")]
    #[case("rejected_by_")]
    #[case("rejected_by_payment")]
    #[case("DRAFT")]
    #[case("")]
    fn test_status_parse_rejects_unknown(#[case] raw: &str) {
        assert_eq!(ApplicationStatus::parse(raw), None);
    }

    #[test]
    fn test_status_editable() {
        assert!(ApplicationStatus::Draft.is_editable());
        assert!(ApplicationStatus::Rejected(Stage::AssistantEngineer).is_editable());
        assert!(!ApplicationStatus::Pending(Stage::AssistantEngineer).is_editable());
        assert!(!ApplicationStatus::Completed.is_editable());
        assert!(ApplicationStatus::Completed.is_terminal());
    }

    #[test]
    fn test_status_serde_uses_codes() {
        let json = serde_json::to_string(&ApplicationStatus::Pending(Stage::Clerk)).unwrap();
        assert_eq!(json, "\"clerk_pending\"");
        let back: ApplicationStatus = serde_json::from_str("\"rejected_by_ee2\"").unwrap();
        assert_eq!(
            back,
            ApplicationStatus::Rejected(Stage::ExecutiveEngineerStage2)
        );
        assert!(serde_json::from_str::<ApplicationStatus>("\"bogus\"").is_err());
        assert!(serde_json::from_str::<ApplicationStatus>("\"rejected_by_payment\"").is_err());
    }

    #[test]
    fn test_every_parsed_rejection_has_an_officer_stage() {
        for stage in Stage::ALL {
            let code = format!("rejected_by_{}", stage.code());
            assert_eq!(
                ApplicationStatus::parse(&code).is_some(),
                stage != Stage::Payment,
                "{code}"
            );
        }
    }

    #[test]
    fn test_stage_order() {
        for (idx, stage) in Stage::ALL.iter().enumerate() {
            assert_eq!(stage.ordinal(), idx);
            assert_eq!(Stage::parse(stage.code()), Some(*stage));
        }
    }

    #[test]
    fn test_roles_and_positions_parse() {
        for role in OfficerRole::ALL {
            assert_eq!(OfficerRole::parse(role.as_str()), Some(role));
        }
        for position in PositionType::ALL {
            assert_eq!(PositionType::parse(position.as_str()), Some(position));
        }
        assert_eq!(OfficerRole::parse("admin"), None);
    }

    #[test]
    fn test_actor_from_claims() {
        let id = Uuid::new_v4();
        let claims = Claims::new(id, ActorRole::CityEngineer, Utc::now());
        let actor = Actor::from_claims(&claims);
        assert_eq!(actor.id, id);
        assert_eq!(actor.officer_role(), Some(OfficerRole::CityEngineer));

        let claims = Claims::new(id, ActorRole::Applicant, Utc::now());
        assert_eq!(Actor::from_claims(&claims).kind, ActorKind::Applicant);
    }
}
