//! Workflow repository: every state-changing step of an application.
//!
//! Each operation runs inside one database transaction and returns the
//! notification events it produced. Status writes are optimistic
//! (`WHERE id = ? AND version = ?`); losing the race fails the operation
//! with `InvalidStageAction` and leaves nothing behind.
//!
//! Signing is the exception to the single transaction: the OTP is consumed
//! and committed first, then the HSM is called, then the transition is
//! written in a second transaction. A consumed OTP is never restored.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use permitflow_core::payment::{
    CallbackOutcome, FeeSchedule, PaymentCallback, PaymentGateway, PaymentRedirect, PaymentStatus,
};
use permitflow_core::render::{DocumentContext, PdfRenderer};
use permitflow_core::signature::{
    DEFAULT_OTP_VALIDITY_SECS, KeyLabelRegistry, OtpDispatch, OtpService, OtpTicket, SignRequest,
    SignatureGateway,
};
use permitflow_core::storage::DocumentStore;
use permitflow_core::verification::{DocumentType, VerificationPolicy};
use permitflow_core::workflow::{
    Actor, ActorKind, ApplicationStatus, FollowUp, Stage, WorkflowAction, WorkflowError,
    WorkflowEvent, WorkflowOrchestrator,
};
use permitflow_shared::types::{Currency, Money, PageRequest, PageResponse};

use crate::entities::{
    application_documents, application_status_history, applications, payments, stage_reviews,
};

use super::application::{
    current_review, document_record, document_records, ensure_can_view, find_application,
    parse_position, parse_status, to_stage_review,
};
use super::officer::select_officer;
use super::{db_error, otp, payment};

/// Result of a workflow operation plus the events it triggered.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowOutcome<T> {
    /// The updated record.
    pub data: T,
    /// Notification events, in the order they happened.
    pub events: Vec<WorkflowEvent>,
}

impl<T> WorkflowOutcome<T> {
    const fn new(data: T, events: Vec<WorkflowEvent>) -> Self {
        Self { data, events }
    }
}

/// A payment attempt and the form that starts it.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentInitiation {
    /// The pending payment row.
    pub payment: payments::Model,
    /// Gateway redirect form.
    pub redirect: PaymentRedirect,
}

/// One entry in an officer's work queue.
#[derive(Debug, Clone, Serialize)]
pub struct QueueItem {
    /// The application waiting on the officer.
    pub application: applications::Model,
    /// The officer's open review.
    pub review: stage_reviews::Model,
}

/// A downloadable certificate.
#[derive(Debug, Clone)]
pub struct CertificateFile {
    /// Certificate number printed on the document.
    pub certificate_number: String,
    /// Suggested file name.
    pub file_name: String,
    /// Signed PDF bytes.
    pub bytes: Vec<u8>,
}

/// Workflow repository.
pub struct WorkflowRepository<G> {
    db: DatabaseConnection,
    gateway: Arc<G>,
    store: DocumentStore,
    renderer: PdfRenderer,
    key_labels: Arc<KeyLabelRegistry>,
    fees: FeeSchedule,
    payments: PaymentGateway,
    otp_validity_secs: i64,
}

impl<G> Clone for WorkflowRepository<G> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            gateway: Arc::clone(&self.gateway),
            store: self.store.clone(),
            renderer: self.renderer.clone(),
            key_labels: Arc::clone(&self.key_labels),
            fees: self.fees.clone(),
            payments: self.payments.clone(),
            otp_validity_secs: self.otp_validity_secs,
        }
    }
}

impl<G: SignatureGateway> WorkflowRepository<G> {
    /// Creates a workflow repository with default key labels, fees,
    /// signature layout and OTP validity.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        gateway: Arc<G>,
        store: DocumentStore,
        payments: PaymentGateway,
    ) -> Self {
        Self {
            db,
            gateway,
            store,
            renderer: PdfRenderer::default(),
            key_labels: Arc::new(KeyLabelRegistry::with_defaults()),
            fees: FeeSchedule::with_defaults(payments.currency()),
            payments,
            otp_validity_secs: DEFAULT_OTP_VALIDITY_SECS,
        }
    }

    /// Replaces the renderer (and with it the signature layout).
    #[must_use]
    pub fn with_renderer(mut self, renderer: PdfRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Replaces the key-label registry.
    #[must_use]
    pub fn with_key_labels(mut self, registry: KeyLabelRegistry) -> Self {
        self.key_labels = Arc::new(registry);
        self
    }

    /// Replaces the fee schedule.
    #[must_use]
    pub fn with_fees(mut self, fees: FeeSchedule) -> Self {
        self.fees = fees;
        self
    }

    /// Sets the OTP validity window.
    #[must_use]
    pub const fn with_otp_validity(mut self, secs: i64) -> Self {
        self.otp_validity_secs = secs;
        self
    }

    /// Attaches an uploaded document to an editable application.
    ///
    /// # Errors
    ///
    /// * `Unauthorized` unless the actor owns the application
    /// * `InvalidStageAction` unless the application is a draft or rejected
    /// * `Validation` for generated types, empty files or blank names
    /// * `Storage` if the upload cannot be written
    pub async fn attach_document(
        &self,
        application_id: Uuid,
        actor: &Actor,
        document_type: DocumentType,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<application_documents::Model, WorkflowError> {
        let application = find_application(&self.db, application_id).await?;
        let status = parse_status(&application)?;
        VerificationPolicy::ensure_attachable(
            status,
            application.applicant_id,
            actor,
            document_type,
        )?;
        if file_name.trim().is_empty() {
            return Err(WorkflowError::Validation("file name is required".to_string()));
        }
        if bytes.is_empty() {
            return Err(WorkflowError::Validation("file is empty".to_string()));
        }

        let document_id = Uuid::new_v4();
        let key = DocumentStore::upload_key(application_id, document_id, file_name);
        let stored = self.store.write(&key, bytes).await?;

        let now = Utc::now().into();
        let inserted = application_documents::ActiveModel {
            id: Set(document_id),
            application_id: Set(application_id),
            document_type: Set(document_type.as_str().to_string()),
            file_name: Set(file_name.trim().to_string()),
            file_path: Set(stored.key.clone()),
            verified: Set(false),
            verified_by: Set(None),
            verified_stage: Set(None),
            verified_at: Set(None),
            remarks: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await;

        match inserted {
            Ok(document) => {
                info!(
                    application_id = %application_id,
                    document_id = %document.id,
                    document_type = %document_type,
                    size = stored.size,
                    "Document attached"
                );
                Ok(document)
            }
            Err(err) => {
                if let Err(cleanup) = self.store.delete(&stored.key).await {
                    warn!(key = %stored.key, error = %cleanup, "Orphaned upload left in storage");
                }
                Err(db_error(err))
            }
        }
    }

    /// Submits or resubmits an application, opening a new review cycle at JE.
    ///
    /// Verification flags from an earlier cycle are cleared.
    ///
    /// # Errors
    ///
    /// * `Unauthorized` unless the actor owns the application
    /// * `InvalidStageAction` unless it is a draft or rejected
    /// * `Validation` if no document is attached
    /// * `NoOfficerAvailable` if no active JE exists
    pub async fn submit(
        &self,
        application_id: Uuid,
        actor: &Actor,
    ) -> Result<WorkflowOutcome<applications::Model>, WorkflowError> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let application = find_application(&txn, application_id).await?;
        let status = parse_status(&application)?;
        let documents = document_records(&txn, application_id).await?;

        let outcome = WorkflowOrchestrator::submit(
            status,
            application.cycle,
            application.applicant_id,
            actor,
            &documents,
        )?;

        let reviewable: Vec<Uuid> = documents
            .iter()
            .filter(|d| !d.document_type.is_generated())
            .map(|d| d.id)
            .collect();
        application_documents::Entity::update_many()
            .col_expr(application_documents::Column::Verified, Expr::value(false))
            .col_expr(
                application_documents::Column::VerifiedBy,
                Expr::value(Option::<Uuid>::None),
            )
            .col_expr(
                application_documents::Column::VerifiedStage,
                Expr::value(Option::<String>::None),
            )
            .col_expr(
                application_documents::Column::VerifiedAt,
                Expr::value(Option::<chrono::DateTime<chrono::FixedOffset>>::None),
            )
            .filter(application_documents::Column::Id.is_in(reviewable))
            .exec(&txn)
            .await
            .map_err(db_error)?;

        let updated = apply_transition(&txn, &application, &outcome.action, "submit").await?;
        let mut events = vec![outcome.action.event(application_id)];
        let updated = self
            .run_follow_ups(&txn, updated, &outcome.follow_ups, &mut events)
            .await?;

        txn.commit().await.map_err(db_error)?;

        info!(
            application_id = %application_id,
            cycle = updated.cycle,
            status = %updated.status,
            "Application submitted"
        );
        Ok(WorkflowOutcome::new(updated, events))
    }

    /// Records the assigned officer's review of one uploaded document.
    ///
    /// # Errors
    ///
    /// * `DocumentNotFound` if the document is not part of the application
    /// * `Unauthorized` unless the actor is the assigned officer of the stage
    /// * `InvalidStageAction` if no officer stage is pending
    pub async fn verify_document(
        &self,
        application_id: Uuid,
        document_id: Uuid,
        actor: &Actor,
        approved: bool,
        remarks: Option<String>,
    ) -> Result<application_documents::Model, WorkflowError> {
        let application = find_application(&self.db, application_id).await?;
        let status = parse_status(&application)?;

        let document = application_documents::Entity::find_by_id(document_id)
            .filter(application_documents::Column::ApplicationId.eq(application_id))
            .one(&self.db)
            .await
            .map_err(db_error)?
            .ok_or(WorkflowError::DocumentNotFound(document_id))?;
        let record = document_record(&document)?;

        let review = match status.pending_stage() {
            Some(stage) => current_review(&self.db, &application, stage).await?,
            None => None,
        };
        if review.as_ref().is_some_and(|r| r.approved || r.rejected) {
            return Err(WorkflowError::invalid(status, "verify documents"));
        }

        let decision = VerificationPolicy::review(
            status,
            actor,
            review.as_ref().map(|r| r.officer_id),
            &record,
            approved,
            remarks,
        )?;

        let mut active: application_documents::ActiveModel = document.into();
        active.verified = Set(decision.verified);
        active.verified_by = Set(Some(decision.verified_by));
        active.verified_stage = Set(Some(decision.verified_stage.code().to_string()));
        active.verified_at = Set(Some(decision.verified_at.into()));
        active.remarks = Set(decision.remarks);
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&self.db).await.map_err(db_error)?;

        info!(
            application_id = %application_id,
            document_id = %document_id,
            officer_id = %actor.id,
            verified = approved,
            stage = %decision.verified_stage,
            "Document reviewed"
        );
        Ok(updated)
    }

    /// Issues a signing OTP to the assigned officer through the HSM.
    ///
    /// Any earlier active OTP for the same application and stage is
    /// deactivated. The OTP is committed before dispatch; if the HSM cannot be
    /// reached it is deactivated again.
    ///
    /// # Errors
    ///
    /// * `Unauthorized` unless the actor is the assigned officer
    /// * `DocumentNotVerified` if review is incomplete
    /// * `MissingKeyLabel` if no HSM key is configured for the officer
    /// * `OtpServiceUnavailable` if the HSM rejects or cannot be reached
    pub async fn request_signature_otp(
        &self,
        application_id: Uuid,
        actor: &Actor,
    ) -> Result<OtpTicket, WorkflowError> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let application = find_application(&txn, application_id).await?;
        let status = parse_status(&application)?;
        let stage = status
            .pending_stage()
            .ok_or_else(|| WorkflowError::invalid(status, "request OTP"))?;
        let review = current_review(&txn, &application, stage).await?;
        let documents = document_records(&txn, application_id).await?;

        let plan = WorkflowOrchestrator::prepare_signature(
            status,
            actor,
            &to_stage_review(review.as_ref()),
            &documents,
        )?;
        let position = parse_position(&application)?;
        let key_label = self.key_labels.lookup(plan.role, position)?.to_string();

        let code = OtpService::generate_code();
        let now = Utc::now();
        let issued = otp::issue(
            &txn,
            &OtpService::identifier_for(actor.id),
            &OtpService::purpose_for(application_id, application.cycle, plan.stage),
            &code,
            OtpService::expires_at(now, self.otp_validity_secs),
        )
        .await?;
        txn.commit().await.map_err(db_error)?;

        let dispatch = OtpDispatch {
            key_label,
            transaction_ref: issued.id.to_string(),
            otp: code,
        };
        if let Err(err) = self.gateway.send_otp(&dispatch).await {
            warn!(
                application_id = %application_id,
                officer_id = %actor.id,
                otp_id = %issued.id,
                error = %err,
                "OTP dispatch failed"
            );
            otp::expire(&self.db, issued.id).await?;
            return Err(WorkflowError::OtpServiceUnavailable(err.to_string()));
        }

        info!(
            application_id = %application_id,
            officer_id = %actor.id,
            stage = %plan.stage,
            otp_id = %issued.id,
            "Signing OTP issued"
        );
        Ok(OtpTicket {
            otp_id: issued.id,
            application_id,
            stage: plan.stage,
            expires_at: issued.expires_at.with_timezone(&Utc),
        })
    }

    /// Verifies the OTP, has the HSM sign the stage document and advances.
    ///
    /// # Errors
    ///
    /// * `OtpNotFound` / `OtpExpired` / `OtpMismatch` for OTP problems; a
    ///   mismatch leaves the OTP active, an expired OTP is deactivated
    /// * `SignerServiceUnavailable` if the HSM fails after the OTP was
    ///   consumed; the status is unchanged and a fresh OTP is needed
    /// * `InvalidStageAction` if another writer changed the application
    pub async fn sign(
        &self,
        application_id: Uuid,
        actor: &Actor,
        otp_code: &str,
        remarks: Option<String>,
    ) -> Result<WorkflowOutcome<applications::Model>, WorkflowError> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let application = find_application(&txn, application_id).await?;
        let status = parse_status(&application)?;
        let stage = status
            .pending_stage()
            .ok_or_else(|| WorkflowError::invalid(status, "sign"))?;
        let review_row = current_review(&txn, &application, stage).await?;
        let review = to_stage_review(review_row.as_ref());
        let documents = document_records(&txn, application_id).await?;

        let plan = WorkflowOrchestrator::prepare_signature(status, actor, &review, &documents)?;
        let position = parse_position(&application)?;
        let key_label = self.key_labels.lookup(plan.role, position)?.to_string();
        let document_key = DocumentStore::generated_key(application_id, plan.document);
        let unsigned = self.store.read(&document_key).await?;

        let identifier = OtpService::identifier_for(actor.id);
        let purpose = OtpService::purpose_for(application_id, application.cycle, plan.stage);
        let active = otp::find_active(&txn, &identifier, &purpose)
            .await?
            .ok_or(WorkflowError::OtpNotFound)?;
        let now = Utc::now();
        match OtpService::check(&otp::to_record(&active), otp_code, now) {
            Ok(()) => {}
            Err(WorkflowError::OtpExpired) => {
                otp::expire(&txn, active.id).await?;
                txn.commit().await.map_err(db_error)?;
                return Err(WorkflowError::OtpExpired);
            }
            Err(err) => return Err(err),
        }
        otp::consume(&txn, active.id, now).await?;
        txn.commit().await.map_err(db_error)?;

        let request = SignRequest {
            key_label,
            otp: otp_code.to_string(),
            transaction_ref: active.id.to_string(),
            document: unsigned,
            coordinates: self.renderer.layout().resolve(plan.document, plan.role),
        };
        let signed = match self.gateway.sign_document(&request).await {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(
                    application_id = %application_id,
                    officer_id = %actor.id,
                    stage = %plan.stage,
                    error = %err,
                    "Signing failed after OTP consumption"
                );
                return Err(WorkflowError::SignerServiceUnavailable(err.to_string()));
            }
        };
        let stored = self.store.write(&document_key, signed).await?;

        let txn = self.db.begin().await.map_err(db_error)?;
        let outcome = WorkflowOrchestrator::complete_signature(status, actor, &review, remarks)?;
        let updated = apply_transition(&txn, &application, &outcome.action, "sign").await?;

        if let Some(row) = review_row {
            let signed_at = outcome.action.occurred_at().fixed_offset();
            let mut active_review: stage_reviews::ActiveModel = row.into();
            active_review.approved = Set(true);
            active_review.approved_at = Set(Some(signed_at));
            active_review.signature_applied = Set(true);
            active_review.signed_at = Set(Some(signed_at));
            active_review.signed_document_ref = Set(Some(stored.key.clone()));
            active_review.update(&txn).await.map_err(db_error)?;
        }

        let mut events = vec![outcome.action.event(application_id)];
        let updated = self
            .run_follow_ups(&txn, updated, &outcome.follow_ups, &mut events)
            .await?;
        txn.commit().await.map_err(db_error)?;

        info!(
            application_id = %application_id,
            officer_id = %actor.id,
            stage = %plan.stage,
            status = %updated.status,
            document = %plan.document,
            "Stage signed"
        );
        Ok(WorkflowOutcome::new(updated, events))
    }

    /// Rejects the application at the current stage.
    ///
    /// Every outstanding signing OTP of the application is deactivated.
    ///
    /// # Errors
    ///
    /// * `RejectionReasonRequired` for blank comments
    /// * `Unauthorized` unless the actor is the assigned officer
    /// * `InvalidStageAction` if no officer stage is pending
    pub async fn reject(
        &self,
        application_id: Uuid,
        actor: &Actor,
        comments: String,
    ) -> Result<WorkflowOutcome<applications::Model>, WorkflowError> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let application = find_application(&txn, application_id).await?;
        let status = parse_status(&application)?;
        let stage = status
            .pending_stage()
            .ok_or_else(|| WorkflowError::invalid(status, "reject"))?;
        let review_row = current_review(&txn, &application, stage).await?;

        let outcome = WorkflowOrchestrator::reject(
            status,
            actor,
            &to_stage_review(review_row.as_ref()),
            comments,
        )?;
        let updated = apply_transition(&txn, &application, &outcome.action, "reject").await?;

        if let Some(row) = review_row {
            let mut active_review: stage_reviews::ActiveModel = row.into();
            active_review.rejected = Set(true);
            active_review.rejection_comments = Set(outcome.action.remarks());
            active_review.rejected_at = Set(Some(outcome.action.occurred_at().fixed_offset()));
            active_review.update(&txn).await.map_err(db_error)?;
        }
        let revoked = otp::deactivate_for_application(&txn, application_id).await?;

        txn.commit().await.map_err(db_error)?;

        info!(
            application_id = %application_id,
            officer_id = %actor.id,
            stage = %stage,
            revoked_otps = revoked,
            "Application rejected"
        );
        Ok(WorkflowOutcome::new(
            updated,
            vec![outcome.action.event(application_id)],
        ))
    }

    /// Starts (or resumes) payment of the registration fee.
    ///
    /// A pending attempt is reused; after a failed attempt a new order is
    /// created.
    ///
    /// # Errors
    ///
    /// * `Unauthorized` unless the actor owns the application
    /// * `InvalidStageAction` unless the application waits at payment
    pub async fn initiate_payment(
        &self,
        application_id: Uuid,
        actor: &Actor,
    ) -> Result<WorkflowOutcome<PaymentInitiation>, WorkflowError> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let application = find_application(&txn, application_id).await?;
        if actor.kind != ActorKind::Applicant || actor.id != application.applicant_id {
            return Err(WorkflowError::Unauthorized(
                "only the owning applicant may pay".to_string(),
            ));
        }
        let status = parse_status(&application)?;
        if status != ApplicationStatus::Pending(Stage::Payment) {
            return Err(WorkflowError::invalid(status, "initiate payment"));
        }

        let mut events = Vec::new();
        let latest = payment::latest_for_application(&txn, application_id).await?;
        let reusable = match latest {
            Some(row) => match payment::parse_status(&row)? {
                PaymentStatus::Pending => Some(row),
                PaymentStatus::Completed => {
                    return Err(WorkflowError::invalid(status, "initiate payment"));
                }
                PaymentStatus::Failed | PaymentStatus::Refunded => None,
            },
            None => None,
        };
        let attempt = match reusable {
            Some(row) => row,
            None => {
                let row = self.request_payment(&txn, &application).await?;
                events.push(WorkflowEvent::PaymentRequested {
                    application_id,
                    order_id: row.order_id.clone(),
                    amount_paise: row.amount_paise,
                });
                row
            }
        };
        txn.commit().await.map_err(db_error)?;

        let amount = Money::from_minor_units(attempt.amount_paise, payment_currency(&attempt)?);
        let redirect = self.payments.redirect(&attempt.order_id, &amount);

        info!(
            application_id = %application_id,
            order_id = %attempt.order_id,
            amount = %amount,
            "Payment initiated"
        );
        Ok(WorkflowOutcome::new(
            PaymentInitiation {
                payment: attempt,
                redirect,
            },
            events,
        ))
    }

    /// Applies a gateway callback.
    ///
    /// The checksum is verified before anything else. A callback for a
    /// payment that is no longer pending changes nothing.
    ///
    /// # Errors
    ///
    /// * `Payment(OrderNotFound)` for an unknown order
    /// * `Payment(ChecksumMismatch)` / `Payment(AmountMismatch)` for a
    ///   forged or inconsistent callback
    pub async fn payment_callback(
        &self,
        callback: &PaymentCallback,
    ) -> Result<WorkflowOutcome<payments::Model>, WorkflowError> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let attempt = payment::find_by_order(&txn, &callback.order_id).await?;
        let outcome = self.payments.verify_callback(callback, attempt.amount_paise)?;

        if payment::parse_status(&attempt)? != PaymentStatus::Pending {
            info!(
                order_id = %callback.order_id,
                status = %attempt.status,
                "Repeated payment callback ignored"
            );
            return Ok(WorkflowOutcome::new(attempt, Vec::new()));
        }

        let response = serde_json::json!({
            "order_id": callback.order_id,
            "transaction_id": callback.transaction_id,
            "status": callback.status,
            "amount": callback.amount,
        });
        if !payment::settle(&txn, attempt.id, &outcome, response).await? {
            return Ok(WorkflowOutcome::new(attempt, Vec::new()));
        }

        let mut events = Vec::new();
        match &outcome {
            CallbackOutcome::Succeeded { transaction_id, .. } => {
                let application = find_application(&txn, attempt.application_id).await?;
                let status = parse_status(&application)?;
                let advanced =
                    WorkflowOrchestrator::confirm_payment(status, transaction_id.clone())?;
                let updated =
                    apply_transition(&txn, &application, &advanced.action, "confirm payment")
                        .await?;
                events.push(advanced.action.event(application.id));
                self.run_follow_ups(&txn, updated, &advanced.follow_ups, &mut events)
                    .await?;
                info!(
                    application_id = %attempt.application_id,
                    order_id = %attempt.order_id,
                    transaction_id = %transaction_id,
                    "Payment completed"
                );
            }
            CallbackOutcome::Failed {
                transaction_id,
                reason,
            } => {
                warn!(
                    application_id = %attempt.application_id,
                    order_id = %attempt.order_id,
                    transaction_id = %transaction_id,
                    reason = %reason,
                    "Payment failed"
                );
            }
        }

        let settled = payment::find_by_order(&txn, &callback.order_id).await?;
        txn.commit().await.map_err(db_error)?;
        Ok(WorkflowOutcome::new(settled, events))
    }

    /// Applications waiting on the acting officer, oldest assignment first.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` for non-officers.
    pub async fn officer_queue(
        &self,
        actor: &Actor,
        page: &PageRequest,
    ) -> Result<PageResponse<QueueItem>, WorkflowError> {
        if actor.officer_role().is_none() {
            return Err(WorkflowError::Unauthorized(
                "only officers have a work queue".to_string(),
            ));
        }
        let page = page.normalized();

        let paginator = stage_reviews::Entity::find()
            .find_also_related(applications::Entity)
            .filter(stage_reviews::Column::OfficerId.eq(actor.id))
            .filter(stage_reviews::Column::Approved.eq(false))
            .filter(stage_reviews::Column::Rejected.eq(false))
            .filter(
                Expr::col((stage_reviews::Entity, stage_reviews::Column::Cycle))
                    .equals((applications::Entity, applications::Column::Cycle)),
            )
            .order_by_asc(stage_reviews::Column::AssignedAt)
            .paginate(&self.db, page.limit());
        let total = paginator.num_items().await.map_err(db_error)?;
        let rows = paginator
            .fetch_page(u64::from(page.page - 1))
            .await
            .map_err(db_error)?;

        let data = rows
            .into_iter()
            .filter_map(|(review, application)| {
                application.map(|application| QueueItem {
                    application,
                    review,
                })
            })
            .collect();
        Ok(PageResponse::new(data, page.page, page.per_page, total))
    }

    /// The signed certificate of a completed application.
    ///
    /// # Errors
    ///
    /// * `Unauthorized` for another applicant's application
    /// * `InvalidStageAction` unless the application is completed
    /// * `Storage` if the file is missing
    pub async fn certificate(
        &self,
        application_id: Uuid,
        actor: &Actor,
    ) -> Result<CertificateFile, WorkflowError> {
        let application = find_application(&self.db, application_id).await?;
        ensure_can_view(&application, actor)?;
        let status = parse_status(&application)?;
        let Some(certificate_number) = application
            .certificate_number
            .clone()
            .filter(|_| status == ApplicationStatus::Completed)
        else {
            return Err(WorkflowError::invalid(status, "download certificate"));
        };

        let bytes = self
            .store
            .read(&DocumentStore::generated_key(
                application_id,
                DocumentType::Certificate,
            ))
            .await?;
        Ok(CertificateFile {
            file_name: format!("{certificate_number}.pdf"),
            certificate_number,
            bytes,
        })
    }

    async fn run_follow_ups(
        &self,
        txn: &DatabaseTransaction,
        mut application: applications::Model,
        follow_ups: &[FollowUp],
        events: &mut Vec<WorkflowEvent>,
    ) -> Result<applications::Model, WorkflowError> {
        for follow_up in follow_ups {
            match *follow_up {
                FollowUp::RenderDocument(kind) => {
                    self.render_document(txn, &application, kind).await?;
                }
                FollowUp::AssignOfficer { stage, role } => {
                    let officer = select_officer(txn, role).await?;
                    stage_reviews::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        application_id: Set(application.id),
                        stage: Set(stage.code().to_string()),
                        cycle: Set(application.cycle),
                        officer_id: Set(officer.id),
                        assigned_at: Set(Utc::now().into()),
                        approved: Set(false),
                        approved_at: Set(None),
                        rejected: Set(false),
                        rejection_comments: Set(None),
                        rejected_at: Set(None),
                        signature_applied: Set(false),
                        signed_at: Set(None),
                        signed_document_ref: Set(None),
                    }
                    .insert(txn)
                    .await
                    .map_err(db_error)?;

                    info!(
                        application_id = %application.id,
                        stage = %stage,
                        officer_id = %officer.id,
                        "Officer assigned"
                    );
                    events.push(WorkflowEvent::OfficerAssigned {
                        application_id: application.id,
                        stage,
                        officer_id: officer.id,
                    });
                }
                FollowUp::RequestPayment => {
                    let row = self.request_payment(txn, &application).await?;
                    events.push(WorkflowEvent::PaymentRequested {
                        application_id: application.id,
                        order_id: row.order_id,
                        amount_paise: row.amount_paise,
                    });
                }
                FollowUp::IssueCertificate => {
                    let number = certificate_number(&application.application_number);
                    let mut active: applications::ActiveModel = application.into();
                    active.certificate_number = Set(Some(number.clone()));
                    active.completed_at = Set(Some(Utc::now().into()));
                    application = active.update(txn).await.map_err(db_error)?;

                    info!(
                        application_id = %application.id,
                        certificate_number = %number,
                        "Certificate issued"
                    );
                    events.push(WorkflowEvent::CertificateIssued {
                        application_id: application.id,
                        certificate_number: number,
                    });
                }
            }
        }
        Ok(application)
    }

    async fn render_document(
        &self,
        txn: &DatabaseTransaction,
        application: &applications::Model,
        kind: DocumentType,
    ) -> Result<(), WorkflowError> {
        let mut context = DocumentContext::new(
            application.application_number.clone(),
            application.applicant_name.clone(),
            parse_position(application)?,
            Utc::now().date_naive(),
        );
        if kind == DocumentType::PaymentChallan
            && let Some(paid) = payment::completed_for_application(txn, application.id).await?
        {
            let fee = Money::from_minor_units(paid.amount_paise, payment_currency(&paid)?);
            context = context.with_payment(fee, paid.order_id, paid.transaction_id);
        }

        let bytes = self.renderer.render(kind, &context)?;
        let stored = self
            .store
            .write(&DocumentStore::generated_key(application.id, kind), bytes)
            .await?;
        upsert_generated_document(txn, application.id, kind, &stored.key).await?;

        info!(
            application_id = %application.id,
            document = %kind,
            size = stored.size,
            "Document rendered"
        );
        Ok(())
    }

    async fn request_payment(
        &self,
        txn: &DatabaseTransaction,
        application: &applications::Model,
    ) -> Result<payments::Model, WorkflowError> {
        let fee = self.fees.fee_for(parse_position(application)?)?;
        let row = payment::create_pending(
            txn,
            application.id,
            PaymentGateway::new_order_id(),
            &fee,
        )
        .await?;
        info!(
            application_id = %application.id,
            order_id = %row.order_id,
            amount = %fee,
            "Payment requested"
        );
        Ok(row)
    }
}

/// Writes the new status with an optimistic version check and appends the
/// history row.
async fn apply_transition<C: ConnectionTrait>(
    conn: &C,
    application: &applications::Model,
    action: &WorkflowAction,
    action_name: &'static str,
) -> Result<applications::Model, WorkflowError> {
    let new_status = action.new_status();
    let mut update = applications::Entity::update_many()
        .col_expr(applications::Column::Status, Expr::value(new_status.as_str()))
        .col_expr(
            applications::Column::Version,
            Expr::value(application.version + 1),
        )
        .col_expr(
            applications::Column::UpdatedAt,
            Expr::value(Utc::now().fixed_offset()),
        );
    if let WorkflowAction::Submit {
        cycle, submitted_at, ..
    } = action
    {
        update = update
            .col_expr(applications::Column::Cycle, Expr::value(*cycle))
            .col_expr(
                applications::Column::SubmittedAt,
                Expr::value(Some(submitted_at.fixed_offset())),
            );
    }

    let result = update
        .filter(applications::Column::Id.eq(application.id))
        .filter(applications::Column::Version.eq(application.version))
        .exec(conn)
        .await
        .map_err(db_error)?;
    if result.rows_affected == 0 {
        warn!(
            application_id = %application.id,
            version = application.version,
            action = action_name,
            "Concurrent update detected"
        );
        return Err(WorkflowError::invalid(action.from_status(), action_name));
    }

    application_status_history::ActiveModel {
        id: Set(Uuid::new_v4()),
        application_id: Set(application.id),
        from_status: Set(action.from_status().as_str().to_string()),
        status: Set(new_status.as_str().to_string()),
        updated_by: Set(action.performed_by()),
        remarks: Set(action.remarks()),
        created_at: Set(action.occurred_at().into()),
    }
    .insert(conn)
    .await
    .map_err(db_error)?;

    find_application(conn, application.id).await
}

async fn upsert_generated_document<C: ConnectionTrait>(
    conn: &C,
    application_id: Uuid,
    kind: DocumentType,
    key: &str,
) -> Result<(), WorkflowError> {
    let existing = application_documents::Entity::find()
        .filter(application_documents::Column::ApplicationId.eq(application_id))
        .filter(application_documents::Column::DocumentType.eq(kind.as_str()))
        .one(conn)
        .await
        .map_err(db_error)?;

    let now = Utc::now().into();
    if let Some(row) = existing {
        let mut active: application_documents::ActiveModel = row.into();
        active.file_path = Set(key.to_string());
        active.updated_at = Set(now);
        active.update(conn).await.map_err(db_error)?;
    } else {
        application_documents::ActiveModel {
            id: Set(Uuid::new_v4()),
            application_id: Set(application_id),
            document_type: Set(kind.as_str().to_string()),
            file_name: Set(format!("{}.pdf", kind.as_str())),
            file_path: Set(key.to_string()),
            verified: Set(false),
            verified_by: Set(None),
            verified_stage: Set(None),
            verified_at: Set(None),
            remarks: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(conn)
        .await
        .map_err(db_error)?;
    }
    Ok(())
}

fn payment_currency(row: &payments::Model) -> Result<Currency, WorkflowError> {
    row.currency.parse::<Currency>().map_err(|e| {
        WorkflowError::Database(format!("payment {} has invalid currency: {e}", row.id))
    })
}

/// `PF-2026-000042` becomes `PF-CERT-2026-000042`.
fn certificate_number(application_number: &str) -> String {
    application_number.strip_prefix("PF-").map_or_else(
        || format!("PF-CERT-{application_number}"),
        |rest| format!("PF-CERT-{rest}"),
    )
}
