//! Permitflow API server.
//!
//! Loads configuration, wires the HSM client, document store and payment
//! gateway into the workflow repository and serves the HTTP API.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use permitflow_api::{AppState, create_router};
use permitflow_core::payment::{FeeSchedule, PaymentGateway};
use permitflow_core::render::PdfRenderer;
use permitflow_core::signature::{HsmClient, KeyLabelRegistry, SignatureLayout};
use permitflow_core::storage::DocumentStore;
use permitflow_db::{ApplicationRepository, WorkflowRepository, connect_with};
use permitflow_shared::{AppConfig, JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v == "json");
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "permitflow=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = connect_with(&config.database).await?;
    info!("Connected to database");

    let jwt_service = JwtService::new(JwtConfig {
        secret: config.jwt.secret.clone(),
        access_token_expires_minutes: config.jwt.access_token_expires_minutes,
    });

    let hsm = HsmClient::from_config(&config.hsm)?;
    info!(base_url = %config.hsm.base_url, "HSM client configured");

    let store = DocumentStore::from_settings(&config.storage)?;
    info!(provider = ?store.provider(), root = %config.storage.root, "Document storage configured");

    let key_labels = KeyLabelRegistry::with_defaults().with_overrides(&config.hsm.key_labels)?;
    let layout = SignatureLayout::with_defaults().with_overrides(&config.signature_layout)?;
    let fees = FeeSchedule::with_defaults(config.payment.currency)
        .with_overrides(&config.payment.fees)?;

    let workflow = WorkflowRepository::new(
        db.clone(),
        Arc::new(hsm),
        store,
        PaymentGateway::from_config(&config.payment),
    )
    .with_key_labels(key_labels)
    .with_renderer(PdfRenderer::new(layout))
    .with_fees(fees)
    .with_otp_validity(config.hsm.otp_validity_secs);

    let state = AppState {
        db: Arc::new(db.clone()),
        jwt_service: Arc::new(jwt_service),
        applications: ApplicationRepository::new(db),
        workflow,
    };

    let timeout = Duration::from_secs(config.server.request_timeout_secs.max(1));
    let app = create_router(state).layer(TimeoutLayer::new(timeout));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutting down");
}
