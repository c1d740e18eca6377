//! Document types and verification records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::workflow::types::Stage;

/// Kind of document attached to an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// Government photo ID.
    IdentityProof,
    /// Proof of residence.
    AddressProof,
    /// Degree or diploma.
    QualificationCertificate,
    /// Work experience letter.
    ExperienceCertificate,
    /// Passport photograph.
    Photograph,
    /// Signed self declaration.
    SelfDeclaration,
    /// Anything else requested by an officer.
    AdditionalDocument,
    /// Generated; signed by JE, AE, EE1 and CE1.
    RecommendationForm,
    /// Generated; signed by the clerk.
    PaymentChallan,
    /// Generated; signed by EE2 and CE2.
    Certificate,
}

impl DocumentType {
    /// All document types.
    pub const ALL: [Self; 10] = [
        Self::IdentityProof,
        Self::AddressProof,
        Self::QualificationCertificate,
        Self::ExperienceCertificate,
        Self::Photograph,
        Self::SelfDeclaration,
        Self::AdditionalDocument,
        Self::RecommendationForm,
        Self::PaymentChallan,
        Self::Certificate,
    ];

    /// Returns the string representation of the document type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::IdentityProof => "identity_proof",
            Self::AddressProof => "address_proof",
            Self::QualificationCertificate => "qualification_certificate",
            Self::ExperienceCertificate => "experience_certificate",
            Self::Photograph => "photograph",
            Self::SelfDeclaration => "self_declaration",
            Self::AdditionalDocument => "additional_document",
            Self::RecommendationForm => "recommendation_form",
            Self::PaymentChallan => "payment_challan",
            Self::Certificate => "certificate",
        }
    }

    /// Parses a document type from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }

    /// Generated by the system rather than uploaded; never reviewed.
    #[must_use]
    pub const fn is_generated(&self) -> bool {
        matches!(
            self,
            Self::RecommendationForm | Self::PaymentChallan | Self::Certificate
        )
    }

    /// Title printed on generated PDFs.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::IdentityProof => "Identity Proof",
            Self::AddressProof => "Address Proof",
            Self::QualificationCertificate => "Qualification Certificate",
            Self::ExperienceCertificate => "Experience Certificate",
            Self::Photograph => "Photograph",
            Self::SelfDeclaration => "Self Declaration",
            Self::AdditionalDocument => "Additional Document",
            Self::RecommendationForm => "Recommendation Form",
            Self::PaymentChallan => "Payment Challan",
            Self::Certificate => "Registration Certificate",
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verification-relevant view of a stored document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRecord {
    /// Document ID.
    pub id: Uuid,
    /// Document type.
    pub document_type: DocumentType,
    /// Marked verified by an officer.
    pub verified: bool,
    /// Stage at which the last verification happened.
    pub verified_stage: Option<Stage>,
}

/// Fields to write when an officer reviews a document.
#[derive(Debug, Clone)]
pub struct VerificationDecision {
    /// Approved or refused.
    pub verified: bool,
    /// Reviewing officer.
    pub verified_by: Uuid,
    /// Stage of the review.
    pub verified_stage: Stage,
    /// When.
    pub verified_at: DateTime<Utc>,
    /// Officer remarks.
    pub remarks: Option<String>,
}
