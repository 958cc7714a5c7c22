//! # REST API Interface Layer
//!
//! Provides the HTTP endpoints of the allowance service.
//! This layer handles:
//! - Caller resolution from the `X-Api-Key` header
//! - JSON request/response serialization
//! - Error translation from domain errors to HTTP status codes
//!
//! ## Error Format
//!
//! Every failure is returned as `{"detail": "..."}`:
//!
//! | Error                         | Status |
//! |-------------------------------|--------|
//! | invalid input                 | 400    |
//! | missing/unknown key, no scope | 401    |
//! | not the owner's wallet        | 403    |
//! | no such allowance             | 404    |
//! | store unavailable             | 503    |

pub mod allowance_apis;
pub mod api_key;
pub mod errors;
pub mod health_apis;
pub mod mappers;

pub use api_key::Caller;
