//! # mela-store
//!
//! SQLite-backed record store for the Mela vendor marketplace.
//!
//! Each entity collection (`identities`, `vendors`, `products`) is one
//! table; nested profile structures (address, bank details, documents,
//! trust review, image lists) are stored as JSON text columns, so a row
//! reads like a single document.  The crate exposes a synchronous
//! [`Database`] handle wrapping a `rusqlite::Connection` with typed CRUD
//! helpers for every collection.
//!
//! There are no cross-collection transactions: each write is a single
//! statement, and concurrent writers resolve by last-write-wins.

pub mod database;
pub mod identities;
pub mod migrations;
pub mod products;
pub mod vendors;

mod error;

pub use database::Database;
pub use error::StoreError;

// Domain models live in mela-core; re-export them so store consumers see
// one coherent surface.
pub use mela_core::models::*;
pub use mela_core::types::*;
