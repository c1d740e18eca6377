//! Core workflow logic for Permitflow.
//!
//! This crate contains the approval workflow with ZERO web or database
//! dependencies. Stage rules, verification policy, OTP handling, payment
//! verification and document rendering live here; the `db` crate persists
//! their results and the `api` crate exposes them.
//!
//! # Modules
//!
//! - `workflow` - Stage table, transition engine and per-stage orchestration
//! - `verification` - Document verification policy
//! - `signature` - OTPs, HSM key labels, signature placement and the HSM client
//! - `payment` - Fee schedule, gateway redirect and callback verification
//! - `render` - Recommendation form, challan and certificate PDFs
//! - `storage` - Document storage over OpenDAL
//! - `retry` - Bounded retry with backoff for external calls

pub mod payment;
pub mod render;
pub mod retry;
pub mod signature;
pub mod storage;
pub mod verification;
pub mod workflow;
