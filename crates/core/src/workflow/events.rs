//! Notification-trigger events.
//!
//! Operations return these; delivery (email/SMS) happens elsewhere.

use serde::Serialize;
use uuid::Uuid;

use crate::workflow::types::Stage;

/// Something observers may want to be told about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WorkflowEvent {
    /// Applicant submitted or resubmitted.
    ApplicationSubmitted {
        /// Application.
        application_id: Uuid,
        /// Submission round.
        cycle: i32,
    },
    /// An officer was put on a stage.
    OfficerAssigned {
        /// Application.
        application_id: Uuid,
        /// Stage.
        stage: Stage,
        /// Assigned officer.
        officer_id: Uuid,
    },
    /// A stage was signed off.
    StageApproved {
        /// Application.
        application_id: Uuid,
        /// Stage.
        stage: Stage,
        /// Signing officer.
        officer_id: Uuid,
    },
    /// Returned to the applicant.
    ApplicationRejected {
        /// Application.
        application_id: Uuid,
        /// Rejecting stage.
        stage: Stage,
        /// Rejecting officer.
        officer_id: Uuid,
        /// Officer comments.
        comments: String,
    },
    /// Fee is now due.
    PaymentRequested {
        /// Application.
        application_id: Uuid,
        /// Gateway order.
        order_id: String,
        /// Amount in paise.
        amount_paise: i64,
    },
    /// Fee confirmed by the gateway.
    PaymentReceived {
        /// Application.
        application_id: Uuid,
        /// Gateway transaction reference.
        transaction_ref: String,
    },
    /// Final certificate issued.
    CertificateIssued {
        /// Application.
        application_id: Uuid,
        /// Certificate number.
        certificate_number: String,
    },
}

impl WorkflowEvent {
    /// Stable event name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ApplicationSubmitted { .. } => "application_submitted",
            Self::OfficerAssigned { .. } => "officer_assigned",
            Self::StageApproved { .. } => "stage_approved",
            Self::ApplicationRejected { .. } => "application_rejected",
            Self::PaymentRequested { .. } => "payment_requested",
            Self::PaymentReceived { .. } => "payment_received",
            Self::CertificateIssued { .. } => "certificate_issued",
        }
    }

    /// The application the event concerns.
    #[must_use]
    pub const fn application_id(&self) -> Uuid {
        match self {
            Self::ApplicationSubmitted { application_id, .. }
            | Self::OfficerAssigned { application_id, .. }
            | Self::StageApproved { application_id, .. }
            | Self::ApplicationRejected { application_id, .. }
            | Self::PaymentRequested { application_id, .. }
            | Self::PaymentReceived { application_id, .. }
            | Self::CertificateIssued { application_id, .. } => *application_id,
        }
    }
}
