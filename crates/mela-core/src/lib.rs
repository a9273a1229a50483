//! # mela-core
//!
//! Domain model and business rules for the Mela vendor marketplace.
//!
//! This crate is pure: no I/O, no async, no database handles.  It defines
//! the entities persisted by `mela-store` (identities, vendor records,
//! product records), the KYC status machine, and the trust scoring engine
//! that turns a vendor profile into a 0-100 completeness score.

pub mod models;
pub mod trust;
pub mod types;

pub use models::*;
pub use trust::compute_trust_score;
pub use types::*;
