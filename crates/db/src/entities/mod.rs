//! `SeaORM` entities.
//!
//! Enum-valued columns are stored as their string codes and parsed with the
//! core types (`ApplicationStatus::parse`, `Stage::parse`, ...).

pub mod application_documents;
pub mod application_status_history;
pub mod applications;
pub mod officers;
pub mod otp_verifications;
pub mod payments;
pub mod stage_reviews;

pub mod prelude {
    //! Entity re-exports.
    pub use super::application_documents::Entity as ApplicationDocuments;
    pub use super::application_status_history::Entity as ApplicationStatusHistory;
    pub use super::applications::Entity as Applications;
    pub use super::officers::Entity as Officers;
    pub use super::otp_verifications::Entity as OtpVerifications;
    pub use super::payments::Entity as Payments;
    pub use super::stage_reviews::Entity as StageReviews;
}
