//! Document control for QHSE and ship-to-ship transfer operations.
//!
//! The crate models every reviewable form (drill plans, audits, vendor approvals, near-miss
//! reports, ...) as one generic document with a kind-specific catalog entry, and exposes axum
//! routers for the HTTP service in `services/api`.

pub mod config;
pub mod envelope;
pub mod error;
pub mod telemetry;
pub mod workflows;
