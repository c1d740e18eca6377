//! End-to-end tests of the HTTP surface over in-memory SQLite.

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sea_orm::{ConnectOptions, Database};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use permitflow_api::{AppState, create_router};
use permitflow_core::payment::PaymentGateway;
use permitflow_core::signature::HsmClient;
use permitflow_core::storage::DocumentStore;
use permitflow_core::workflow::OfficerRole;
use permitflow_db::migration::{Migrator, MigratorTrait};
use permitflow_db::repositories::{
    ApplicationRepository, CreateOfficerInput, OfficerRepository, WorkflowRepository,
};
use permitflow_shared::config::{HsmConfig, PaymentConfig, RetrySettings};
use permitflow_shared::{ActorRole, JwtConfig, JwtService};

struct TestApp {
    router: Router,
    jwt: Arc<JwtService>,
    je_id: Uuid,
}

impl TestApp {
    async fn new() -> Self {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options
            .max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);
        let db = Database::connect(options).await.unwrap();
        Migrator::up(&db, None).await.unwrap();

        let officers = OfficerRepository::new(db.clone());
        let je = officers
            .create(CreateOfficerInput {
                name: "Vikram Desai".to_string(),
                email: "vikram@permitflow.test".to_string(),
                mobile: None,
                role: OfficerRole::JuniorEngineer,
            })
            .await
            .unwrap();

        // Nothing listens here; every HSM call fails fast.
        let hsm = HsmClient::from_config(&HsmConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 1,
            retry: RetrySettings {
                max_attempts: 1,
                ..RetrySettings::default()
            },
            ..HsmConfig::default()
        })
        .unwrap();
        let payments = PaymentGateway::from_config(&PaymentConfig {
            merchant_id: "PERMITFLOW".to_string(),
            checksum_secret: "test-secret".to_string(),
            ..PaymentConfig::default()
        });
        let workflow = WorkflowRepository::new(
            db.clone(),
            Arc::new(hsm),
            DocumentStore::in_memory().unwrap(),
            payments,
        );

        let jwt = Arc::new(JwtService::new(JwtConfig {
            secret: "api-test-secret".to_string(),
            ..JwtConfig::default()
        }));
        let state = AppState {
            db: Arc::new(db.clone()),
            jwt_service: Arc::clone(&jwt),
            applications: ApplicationRepository::new(db),
            workflow,
        };

        Self {
            router: create_router(state),
            jwt,
            je_id: je.id,
        }
    }

    fn token(&self, user_id: Uuid, role: ActorRole) -> String {
        self.jwt.generate_access_token(user_id, role).unwrap()
    }

    async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn draft(&self, token: &str) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/v1/applications",
                Some(token),
                Some(json!({
                    "applicant_name": "Asha Rao",
                    "applicant_email": "asha@example.com",
                    "position_type": "architect"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    async fn upload(&self, token: &str, id: &str) -> (StatusCode, Value) {
        self.call(
            Method::POST,
            &format!("/api/v1/applications/{id}/documents"),
            Some(token),
            Some(json!({
                "document_type": "identity_proof",
                "file_name": "aadhaar.pdf",
                "content_base64": STANDARD.encode(b"%PDF-1.4 identity"),
            })),
        )
        .await
    }
}

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new().await;
    let (status, body) = app.call(Method::GET, "/api/v1/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], true);
}

#[tokio::test]
async fn test_protected_routes_require_a_valid_token() {
    let app = TestApp::new().await;

    let (status, body) = app
        .call(Method::GET, "/api/v1/applications", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "MISSING_TOKEN");

    let (status, body) = app
        .call(Method::GET, "/api/v1/applications", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_draft_is_visible_only_to_its_owner() {
    let app = TestApp::new().await;
    let owner = app.token(Uuid::new_v4(), ActorRole::Applicant);
    let id = app.draft(&owner).await;

    let (status, body) = app
        .call(Method::GET, &format!("/api/v1/applications/{id}"), Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["application"]["status"], "draft");

    let (status, body) = app
        .call(Method::GET, "/api/v1/applications", Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 1);

    let stranger = app.token(Uuid::new_v4(), ActorRole::Applicant);
    let (status, body) = app
        .call(Method::GET, &format!("/api/v1/applications/{id}"), Some(&stranger), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_upload_rejects_bad_base64() {
    let app = TestApp::new().await;
    let owner = app.token(Uuid::new_v4(), ActorRole::Applicant);
    let id = app.draft(&owner).await;

    let (status, body) = app
        .call(
            Method::POST,
            &format!("/api/v1/applications/{id}/documents"),
            Some(&owner),
            Some(json!({
                "document_type": "identity_proof",
                "file_name": "aadhaar.pdf",
                "content_base64": "***",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_submit_then_otp_with_unreachable_hsm() {
    let app = TestApp::new().await;
    let owner = app.token(Uuid::new_v4(), ActorRole::Applicant);
    let je = app.token(app.je_id, ActorRole::JuniorEngineer);
    let id = app.draft(&owner).await;

    let (status, document) = app.upload(&owner, &id).await;
    assert_eq!(status, StatusCode::CREATED);
    let document_id = document["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .call(
            Method::POST,
            &format!("/api/v1/applications/{id}/submit"),
            Some(&owner),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "je_pending");
    assert_eq!(body["events"][0]["event"], "application_submitted");

    let (status, body) = app
        .call(Method::GET, "/api/v1/workflow/queue", Some(&je), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 1);

    let otp_uri = format!("/api/v1/applications/{id}/signature/otp");
    let (status, body) = app.call(Method::POST, &otp_uri, Some(&je), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "DOCUMENT_NOT_VERIFIED");

    let (status, body) = app
        .call(
            Method::POST,
            &format!("/api/v1/applications/{id}/documents/{document_id}/verify"),
            Some(&je),
            Some(json!({ "approved": true })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["verified"], true);

    let (status, body) = app.call(Method::POST, &otp_uri, Some(&je), None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "OTP_SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn test_reject_without_comments() {
    let app = TestApp::new().await;
    let owner = app.token(Uuid::new_v4(), ActorRole::Applicant);
    let je = app.token(app.je_id, ActorRole::JuniorEngineer);
    let id = app.draft(&owner).await;
    app.upload(&owner, &id).await;
    app.call(
        Method::POST,
        &format!("/api/v1/applications/{id}/submit"),
        Some(&owner),
        None,
    )
    .await;

    let uri = format!("/api/v1/applications/{id}/reject");
    let (status, body) = app
        .call(Method::POST, &uri, Some(&je), Some(json!({ "comments": " " })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "REJECTION_REASON_REQUIRED");

    let (status, body) = app
        .call(
            Method::POST,
            &uri,
            Some(&je),
            Some(json!({ "comments": "Site plan missing" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "rejected_by_je");
}

#[tokio::test]
async fn test_queue_is_for_officers_only() {
    let app = TestApp::new().await;
    let applicant = app.token(Uuid::new_v4(), ActorRole::Applicant);

    let (status, _) = app
        .call(Method::GET, "/api/v1/workflow/queue", Some(&applicant), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_callback_for_unknown_order() {
    let app = TestApp::new().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/payments/callback")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(
            "order_id=PFO-missing&transaction_id=T1&status=success&amount=4000.00&checksum=00",
        ))
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_certificate_before_completion() {
    let app = TestApp::new().await;
    let owner = app.token(Uuid::new_v4(), ActorRole::Applicant);
    let id = app.draft(&owner).await;

    let (status, body) = app
        .call(
            Method::GET,
            &format!("/api/v1/applications/{id}/certificate"),
            Some(&owner),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "INVALID_STAGE_ACTION");
}
