//! Application configuration management.
//!
//! Layers `config/default.toml`, `config/{RUN_MODE}.toml` and
//! `PERMITFLOW__*` environment variables. Every table except
//! `database` and `jwt` has a usable default.

use serde::Deserialize;

use crate::types::Currency;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtConfig,
    /// HSM signer configuration.
    #[serde(default)]
    pub hsm: HsmConfig,
    /// Payment gateway configuration.
    #[serde(default)]
    pub payment: PaymentConfig,
    /// Object storage for generated and signed PDFs.
    #[serde(default)]
    pub storage: StorageSettings,
    /// Signature placement overrides.
    #[serde(default)]
    pub signature_layout: Vec<SignaturePlacement>,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    60
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// Secret key for validating tokens.
    pub secret: String,
    /// Access token expiration in minutes (used by the seeder).
    #[serde(default = "default_access_token_minutes")]
    pub access_token_expires_minutes: i64,
}

fn default_access_token_minutes() -> i64 {
    60
}

/// HSM signer configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HsmConfig {
    /// Base URL of the HSM HTTP API.
    #[serde(default = "default_hsm_url")]
    pub base_url: String,
    /// Value for the `X-Api-Key` header.
    #[serde(default)]
    pub api_key: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_hsm_timeout")]
    pub timeout_secs: u64,
    /// How long an issued OTP stays valid.
    #[serde(default = "default_otp_validity")]
    pub otp_validity_secs: i64,
    /// Retry policy for transient HSM failures.
    #[serde(default)]
    pub retry: RetrySettings,
    /// Key label overrides, merged over the built-in table.
    #[serde(default)]
    pub key_labels: Vec<KeyLabelEntry>,
}

impl Default for HsmConfig {
    fn default() -> Self {
        Self {
            base_url: default_hsm_url(),
            api_key: String::new(),
            timeout_secs: default_hsm_timeout(),
            otp_validity_secs: default_otp_validity(),
            retry: RetrySettings::default(),
            key_labels: Vec::new(),
        }
    }
}

fn default_hsm_url() -> String {
    "http://localhost:9000".to_string()
}

fn default_hsm_timeout() -> u64 {
    10
}

fn default_otp_validity() -> i64 {
    300
}

/// Backoff strategy between retry attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// Constant delay.
    Fixed,
    /// Delay multiplied after each attempt, capped at `max_delay_ms`.
    #[default]
    Exponential,
}

/// Retry settings as written in configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySettings {
    /// Total attempts including the first call.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Backoff strategy.
    #[serde(default)]
    pub strategy: BackoffStrategy,
    /// First delay in milliseconds.
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,
    /// Delay cap in milliseconds.
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
    /// Integer multiplier for exponential backoff.
    #[serde(default = "default_multiplier")]
    pub multiplier: u32,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            strategy: BackoffStrategy::default(),
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
            multiplier: default_multiplier(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> u64 {
    200
}

fn default_max_delay() -> u64 {
    2_000
}

fn default_multiplier() -> u32 {
    2
}

/// One row of the key-label table.
#[derive(Debug, Clone, Deserialize)]
pub struct KeyLabelEntry {
    /// Officer role code, e.g. `assistant_engineer`.
    pub officer_role: String,
    /// Position type code, e.g. `architect`.
    pub position_type: String,
    /// HSM key label.
    pub key_label: String,
}

/// Payment gateway configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// URL the applicant is redirected to.
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,
    /// Merchant identifier issued by the gateway.
    #[serde(default)]
    pub merchant_id: String,
    /// Shared secret for request and callback checksums.
    #[serde(default)]
    pub checksum_secret: String,
    /// Where the gateway sends the applicant back.
    #[serde(default)]
    pub return_url: String,
    /// Currency for all fees.
    #[serde(default)]
    pub currency: Currency,
    /// Fee overrides, merged over the built-in schedule.
    #[serde(default)]
    pub fees: Vec<FeeEntry>,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            gateway_url: default_gateway_url(),
            merchant_id: String::new(),
            checksum_secret: String::new(),
            return_url: String::new(),
            currency: Currency::default(),
            fees: Vec::new(),
        }
    }
}

fn default_gateway_url() -> String {
    "http://localhost:9100/pay".to_string()
}

/// Fee for one position type.
#[derive(Debug, Clone, Deserialize)]
pub struct FeeEntry {
    /// Position type code.
    pub position_type: String,
    /// Fee in paise.
    pub amount_paise: i64,
}

/// Storage backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageProvider {
    /// Local filesystem under `root`.
    #[default]
    Local,
    /// S3-compatible bucket.
    S3,
    /// In-process memory.
    Memory,
}

/// Storage settings.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Backend to use.
    #[serde(default)]
    pub provider: StorageProvider,
    /// Root directory or key prefix.
    #[serde(default = "default_storage_root")]
    pub root: String,
    /// S3 endpoint.
    pub endpoint: Option<String>,
    /// S3 bucket.
    pub bucket: Option<String>,
    /// S3 region.
    pub region: Option<String>,
    /// S3 access key.
    pub access_key_id: Option<String>,
    /// S3 secret key.
    pub secret_access_key: Option<String>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            provider: StorageProvider::default(),
            root: default_storage_root(),
            endpoint: None,
            bucket: None,
            region: None,
            access_key_id: None,
            secret_access_key: None,
        }
    }
}

fn default_storage_root() -> String {
    "./data/documents".to_string()
}

/// Where a signature goes on a generated PDF, in PDF points.
#[derive(Debug, Clone, Deserialize)]
pub struct SignaturePlacement {
    /// Document type code, e.g. `recommendation_form`.
    pub document: String,
    /// Officer role code; `None` applies to every role.
    #[serde(default)]
    pub role: Option<String>,
    /// 1-based page number.
    pub page: u32,
    /// Left edge.
    pub x: u32,
    /// Bottom edge.
    pub y: u32,
    /// Box width.
    pub width: u32,
    /// Box height.
    pub height: u32,
}

impl AppConfig {
    /// Loads configuration from `.env`, config files and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("PERMITFLOW").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
