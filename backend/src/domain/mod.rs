//! # Domain Module
//!
//! Contains the business logic of the allowance service: what a recurring
//! allowance is, when it must be paid, who may change it, and the service
//! and scheduler that drive the storage layer.
//!
//! ## Module Organization
//!
//! - **frequency**: Recurrence rules and the "advance one interval" calculation
//! - **schedule**: Due checks, roll-forward and expiry of a single record
//! - **validation**: Turning untyped drafts and patches into typed records
//! - **wallet_keys**: Resolving API keys to wallets and scopes
//! - **allowance_service**: CRUD operations with ownership checks
//! - **payment_scheduler**: Periodic pay-out of due allowances
//! - **record_locks**: Per-record exclusion shared by the two above
//!
//! ## Business Rules
//!
//! - Amounts are positive whole numbers in the allowance's currency
//! - `next_payment_date` is derived, never taken from the client
//! - Missed ticks collapse into a single payment after an outage
//! - Once the next tick lies beyond `end_date` the allowance switches off
//! - Only the owning wallet's admin key may create, change or delete a record
//! - Every wallet of the same user may read it

pub mod allowance_service;
pub mod commands;
pub mod errors;
pub mod frequency;
pub mod models;
pub mod payment_scheduler;
pub mod record_locks;
pub mod schedule;
pub mod validation;
pub mod wallet_keys;

pub use allowance_service::*;
pub use commands::*;
pub use errors::AllowanceError;
pub use frequency::Frequency;
pub use payment_scheduler::{DryRunGateway, PaymentGateway, PaymentReceipt, PaymentScheduler, TickReport};
pub use record_locks::{RecordGuard, RecordLocks};
pub use wallet_keys::{KeyScope, StaticWalletKeys, WalletAccess, WalletKeyResolver};
