//! Shared types, errors, and configuration for Permitflow.
//!
//! This crate provides common types used across all other crates:
//! - Money in rupees with paise precision
//! - Pagination types for officer queues
//! - Application-wide error types
//! - Configuration management
//! - JWT claims and validation for the acting officer/applicant

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;
pub mod types;

pub use auth::{ActorRole, Claims};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use jwt::{JwtConfig, JwtError, JwtService};
