//! Shared fixtures: in-memory SQLite, an in-memory document store and a
//! fake HSM that records what it was asked to do.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter,
};
use uuid::Uuid;

use permitflow_core::payment::{PaymentCallback, PaymentGateway};
use permitflow_core::signature::{GatewayError, OtpDispatch, SignRequest, SignatureGateway};
use permitflow_core::storage::DocumentStore;
use permitflow_core::verification::DocumentType;
use permitflow_core::workflow::{Actor, OfficerRole, PositionType};
use permitflow_db::entities::{application_documents, application_status_history, applications};
use permitflow_db::migration::{Migrator, MigratorTrait};
use permitflow_db::repositories::{
    ApplicationRepository, CreateApplicationInput, CreateOfficerInput, OfficerRepository,
    WorkflowRepository,
};
use permitflow_shared::config::PaymentConfig;
use permitflow_shared::types::{Currency, Money};

pub const SIGNED_MARKER: &str = "%signed-by ";

/// HSM stand-in. Accepts any OTP; only the workflow checks codes here.
#[derive(Default)]
pub struct FakeGateway {
    dispatched: Mutex<Vec<OtpDispatch>>,
    signed: Mutex<Vec<String>>,
    fail_otp: AtomicBool,
    fail_sign: AtomicBool,
    concurrent_writer: Mutex<Option<(DatabaseConnection, Uuid)>>,
}

impl FakeGateway {
    pub fn fail_otp(&self, fail: bool) {
        self.fail_otp.store(fail, Ordering::SeqCst);
    }

    pub fn fail_sign(&self, fail: bool) {
        self.fail_sign.store(fail, Ordering::SeqCst);
    }

    /// Bumps the application's version while the next signature is in flight.
    pub fn race_next_sign(&self, db: DatabaseConnection, application_id: Uuid) {
        *self.concurrent_writer.lock().unwrap() = Some((db, application_id));
    }

    pub fn last_code(&self) -> String {
        self.dispatched
            .lock()
            .unwrap()
            .last()
            .expect("an OTP was dispatched")
            .otp
            .clone()
    }

    pub fn dispatch_count(&self) -> usize {
        self.dispatched.lock().unwrap().len()
    }

    pub fn signed_labels(&self) -> Vec<String> {
        self.signed.lock().unwrap().clone()
    }
}

impl SignatureGateway for FakeGateway {
    async fn send_otp(&self, dispatch: &OtpDispatch) -> Result<(), GatewayError> {
        // A failed dispatch may still have reached the officer.
        self.dispatched.lock().unwrap().push(dispatch.clone());
        if self.fail_otp.load(Ordering::SeqCst) {
            return Err(GatewayError::Transport("connection reset".to_string()));
        }
        Ok(())
    }

    async fn sign_document(&self, request: &SignRequest) -> Result<Vec<u8>, GatewayError> {
        if self.fail_sign.load(Ordering::SeqCst) {
            return Err(GatewayError::Status {
                status: 503,
                body: "signer busy".to_string(),
            });
        }
        let writer = self.concurrent_writer.lock().unwrap().take();
        if let Some((db, application_id)) = writer {
            applications::Entity::update_many()
                .col_expr(
                    applications::Column::Version,
                    Expr::col(applications::Column::Version).add(1),
                )
                .filter(applications::Column::Id.eq(application_id))
                .exec(&db)
                .await
                .map_err(|e| GatewayError::Transport(e.to_string()))?;
        }
        self.signed.lock().unwrap().push(request.key_label.clone());

        let mut signed = request.document.clone();
        signed.extend_from_slice(format!("\n{SIGNED_MARKER}{}\n", request.key_label).as_bytes());
        Ok(signed)
    }
}

/// One officer per role.
pub struct Officers {
    pub je: Actor,
    pub ae: Actor,
    pub ee: Actor,
    pub ce: Actor,
    pub clerk: Actor,
}

impl Officers {
    pub fn for_role(&self, role: OfficerRole) -> Actor {
        match role {
            OfficerRole::JuniorEngineer => self.je,
            OfficerRole::AssistantEngineer => self.ae,
            OfficerRole::ExecutiveEngineer => self.ee,
            OfficerRole::CityEngineer => self.ce,
            OfficerRole::Clerk => self.clerk,
        }
    }
}

pub struct Harness {
    pub db: DatabaseConnection,
    pub gateway: Arc<FakeGateway>,
    pub store: DocumentStore,
    pub payments: PaymentGateway,
    pub applications: ApplicationRepository,
    pub officer_repo: OfficerRepository,
    pub workflow: WorkflowRepository<FakeGateway>,
    pub officers: Officers,
}

pub async fn setup() -> Harness {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("Failed to open in-memory database");
    Migrator::up(&db, None).await.expect("Migrations failed");

    let gateway = Arc::new(FakeGateway::default());
    let store = DocumentStore::in_memory().expect("memory store");
    let payments = PaymentGateway::from_config(&PaymentConfig {
        merchant_id: "PERMITFLOW".to_string(),
        checksum_secret: "test-secret".to_string(),
        return_url: "http://localhost:8080/payments/return".to_string(),
        ..PaymentConfig::default()
    });
    let workflow = WorkflowRepository::new(
        db.clone(),
        Arc::clone(&gateway),
        store.clone(),
        payments.clone(),
    );
    let officer_repo = OfficerRepository::new(db.clone());

    let officers = Officers {
        je: register(&officer_repo, "je", OfficerRole::JuniorEngineer).await,
        ae: register(&officer_repo, "ae", OfficerRole::AssistantEngineer).await,
        ee: register(&officer_repo, "ee", OfficerRole::ExecutiveEngineer).await,
        ce: register(&officer_repo, "ce", OfficerRole::CityEngineer).await,
        clerk: register(&officer_repo, "clerk", OfficerRole::Clerk).await,
    };

    Harness {
        applications: ApplicationRepository::new(db.clone()),
        db,
        gateway,
        store,
        payments,
        officer_repo,
        workflow,
        officers,
    }
}

pub async fn register(repo: &OfficerRepository, name: &str, role: OfficerRole) -> Actor {
    let officer = repo
        .create(CreateOfficerInput {
            name: format!("Officer {name}"),
            email: format!("{name}-{}@permitflow.test", Uuid::new_v4().simple()),
            mobile: None,
            role,
        })
        .await
        .expect("officer created");
    Actor::officer(officer.id, role)
}

impl Harness {
    /// A draft with one identity proof attached.
    pub async fn draft(&self) -> (Uuid, Actor) {
        let applicant = Actor::applicant(Uuid::new_v4());
        let application = self
            .applications
            .create_draft(
                &applicant,
                CreateApplicationInput {
                    applicant_name: "Asha Rao".to_string(),
                    applicant_email: "asha@example.com".to_string(),
                    applicant_mobile: Some("9800000000".to_string()),
                    position_type: PositionType::StructuralEngineer,
                },
            )
            .await
            .expect("draft created");
        self.workflow
            .attach_document(
                application.id,
                &applicant,
                DocumentType::IdentityProof,
                "aadhaar.pdf",
                b"%PDF-1.4 identity".to_vec(),
            )
            .await
            .expect("document attached");
        (application.id, applicant)
    }

    /// A submitted application waiting at JE.
    pub async fn submitted(&self) -> (Uuid, Actor) {
        let (id, applicant) = self.draft().await;
        self.workflow
            .submit(id, &applicant)
            .await
            .expect("submitted");
        (id, applicant)
    }

    /// The acting officer verifies every uploaded document.
    pub async fn verify_all(&self, application_id: Uuid, officer: &Actor) {
        let documents = application_documents::Entity::find()
            .filter(application_documents::Column::ApplicationId.eq(application_id))
            .all(&self.db)
            .await
            .unwrap();
        for document in documents {
            let generated = DocumentType::parse(&document.document_type)
                .is_some_and(|t| t.is_generated());
            if !generated {
                self.workflow
                    .verify_document(application_id, document.id, officer, true, None)
                    .await
                    .expect("document verified");
            }
        }
    }

    /// Requests an OTP and signs with it.
    pub async fn sign_as(&self, application_id: Uuid, officer: &Actor) -> permitflow_db::WorkflowOutcome<applications::Model> {
        self.workflow
            .request_signature_otp(application_id, officer)
            .await
            .expect("OTP issued");
        let code = self.gateway.last_code();
        self.workflow
            .sign(application_id, officer, &code, None)
            .await
            .expect("signed")
    }

    /// Drives a fresh application to the payment stage.
    pub async fn at_payment(&self) -> (Uuid, Actor) {
        let (id, applicant) = self.submitted().await;
        self.verify_all(id, &self.officers.je).await;
        for officer in [
            self.officers.je,
            self.officers.ae,
            self.officers.ee,
            self.officers.ce,
        ] {
            self.sign_as(id, &officer).await;
        }
        (id, applicant)
    }

    pub async fn status(&self, application_id: Uuid) -> String {
        self.applications
            .find_by_id(application_id)
            .await
            .unwrap()
            .status
    }

    pub async fn history_len(&self, application_id: Uuid) -> u64 {
        application_status_history::Entity::find()
            .filter(application_status_history::Column::ApplicationId.eq(application_id))
            .count(&self.db)
            .await
            .unwrap()
    }

    /// A callback as the gateway would send it.
    pub fn callback(&self, order_id: &str, status: &str, amount_paise: i64) -> PaymentCallback {
        let amount = Money::from_minor_units(amount_paise, Currency::Inr).format_amount();
        let transaction_id = format!("TXN-{order_id}");
        PaymentCallback {
            checksum: self
                .payments
                .callback_checksum(order_id, &transaction_id, status, &amount),
            order_id: order_id.to_string(),
            transaction_id,
            status: status.to_string(),
            amount,
        }
    }
}
