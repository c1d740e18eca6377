//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

use sea_orm::DbErr;

use permitflow_core::workflow::WorkflowError;

pub mod application;
pub mod officer;
mod otp;
mod payment;
pub mod workflow;

pub use application::{ApplicationDetails, ApplicationRepository, CreateApplicationInput};
pub use officer::{CreateOfficerInput, OfficerRepository};
pub use workflow::{
    CertificateFile, PaymentInitiation, QueueItem, WorkflowOutcome, WorkflowRepository,
};

pub(crate) fn db_error(err: DbErr) -> WorkflowError {
    WorkflowError::Database(err.to_string())
}
