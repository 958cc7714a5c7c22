//! # Storage Module
//!
//! Handles all data persistence for the allowance service.
//!
//! The domain layer only talks to the traits in [`traits`]; the SQLite
//! implementations in [`sqlite`] can be swapped for another backend without
//! touching the services.
//!
//! ## Key Responsibilities
//!
//! - **Allowance Records**: Keyed CRUD plus per-wallet listing in creation order
//! - **Payment Attempts**: Outcome log keyed by (allowance, tick) so a retried
//!   tick is never paid twice
//! - **Connection Management**: Pool setup and schema creation
//!
//! ## Current Implementation
//!
//! - **Primary Storage**: SQLite through SQLx, timestamps as RFC 3339 text
//! - **Tests**: Private in-memory database per test

pub mod sqlite;
pub mod traits;

pub use sqlite::*;
pub use traits::*;
