//! Static stage-configuration table.
//!
//! Every stage is described by one row: who acts, what comes before and
//! after, and which generated document the officer signs. The engine and
//! the orchestrator read this table instead of hard-coding per-role logic.

use crate::verification::DocumentType;
use crate::workflow::types::{OfficerRole, Stage};

/// Configuration of a single stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageConfig {
    /// The stage described.
    pub stage: Stage,
    /// Role that acts at this stage; `None` for payment.
    pub role: Option<OfficerRole>,
    /// Previous stage, if any.
    pub predecessor: Option<Stage>,
    /// Next stage; `None` means completion.
    pub successor: Option<Stage>,
    /// Documents must have been verified at this very stage.
    pub requires_own_verification: bool,
    /// Generated document the officer signs.
    pub signs: Option<DocumentType>,
    /// Document rendered when the application enters this stage.
    pub renders_on_entry: Option<DocumentType>,
}

static TABLE: [StageConfig; 8] = [
    StageConfig {
        stage: Stage::JuniorEngineer,
        role: Some(OfficerRole::JuniorEngineer),
        predecessor: None,
        successor: Some(Stage::AssistantEngineer),
        requires_own_verification: true,
        signs: Some(DocumentType::RecommendationForm),
        renders_on_entry: Some(DocumentType::RecommendationForm),
    },
    StageConfig {
        stage: Stage::AssistantEngineer,
        role: Some(OfficerRole::AssistantEngineer),
        predecessor: Some(Stage::JuniorEngineer),
        successor: Some(Stage::ExecutiveEngineerStage1),
        requires_own_verification: false,
        signs: Some(DocumentType::RecommendationForm),
        renders_on_entry: None,
    },
    StageConfig {
        stage: Stage::ExecutiveEngineerStage1,
        role: Some(OfficerRole::ExecutiveEngineer),
        predecessor: Some(Stage::AssistantEngineer),
        successor: Some(Stage::CityEngineerStage1),
        requires_own_verification: false,
        signs: Some(DocumentType::RecommendationForm),
        renders_on_entry: None,
    },
    StageConfig {
        stage: Stage::CityEngineerStage1,
        role: Some(OfficerRole::CityEngineer),
        predecessor: Some(Stage::ExecutiveEngineerStage1),
        successor: Some(Stage::Payment),
        requires_own_verification: false,
        signs: Some(DocumentType::RecommendationForm),
        renders_on_entry: None,
    },
    StageConfig {
        stage: Stage::Payment,
        role: None,
        predecessor: Some(Stage::CityEngineerStage1),
        successor: Some(Stage::Clerk),
        requires_own_verification: false,
        signs: None,
        renders_on_entry: None,
    },
    StageConfig {
        stage: Stage::Clerk,
        role: Some(OfficerRole::Clerk),
        predecessor: Some(Stage::Payment),
        successor: Some(Stage::ExecutiveEngineerStage2),
        requires_own_verification: false,
        signs: Some(DocumentType::PaymentChallan),
        renders_on_entry: Some(DocumentType::PaymentChallan),
    },
    StageConfig {
        stage: Stage::ExecutiveEngineerStage2,
        role: Some(OfficerRole::ExecutiveEngineer),
        predecessor: Some(Stage::Clerk),
        successor: Some(Stage::CityEngineerStage2),
        requires_own_verification: false,
        signs: Some(DocumentType::Certificate),
        renders_on_entry: Some(DocumentType::Certificate),
    },
    StageConfig {
        stage: Stage::CityEngineerStage2,
        role: Some(OfficerRole::CityEngineer),
        predecessor: Some(Stage::ExecutiveEngineerStage2),
        successor: None,
        requires_own_verification: false,
        signs: Some(DocumentType::Certificate),
        renders_on_entry: None,
    },
];

impl StageConfig {
    /// Looks up the row for a stage.
    #[must_use]
    pub fn of(stage: Stage) -> &'static Self {
        &TABLE[stage.ordinal()]
    }

    /// The whole table in lifecycle order.
    #[must_use]
    pub fn table() -> &'static [Self] {
        &TABLE
    }

    /// First stage after submission.
    #[must_use]
    pub const fn first() -> Stage {
        Stage::JuniorEngineer
    }

    /// Returns true if an officer acts at this stage.
    #[must_use]
    pub const fn is_officer_stage(&self) -> bool {
        self.role.is_some()
    }
}
