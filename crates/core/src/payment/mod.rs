//! Fee collection through an external payment gateway.
//!
//! Entering the payment stage creates a Pending payment. The applicant is
//! redirected to the gateway with a checksummed form; the gateway calls
//! back with the result, which is verified here before the workflow moves on.

pub mod checksum;
pub mod error;
pub mod fees;
pub mod gateway;
pub mod types;

pub use checksum::Checksum;
pub use error::PaymentError;
pub use fees::FeeSchedule;
pub use gateway::PaymentGateway;
pub use types::{CallbackOutcome, PaymentCallback, PaymentRedirect, PaymentStatus};
