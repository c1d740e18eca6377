//! Document verification step.
//!
//! Officers review uploaded documents before they may sign. The policy here
//! is pure; persistence of the decision happens in the database crate.

pub mod policy;
pub mod types;

pub use policy::VerificationPolicy;
pub use types::{DocumentRecord, DocumentType, VerificationDecision};
