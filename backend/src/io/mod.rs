//! # IO Module
//!
//! Adapter layer between HTTP clients and the domain logic.
//!
//! Translates requests into domain commands, resolves the caller from the
//! `X-Api-Key` header and maps domain results and errors onto the wire
//! format shared with the allowance forms and scripts.
//!
//! ## Supported Operations
//!
//! - **GET /allowance/api/v1/allowance**: List the caller's allowances
//! - **GET /allowance/api/v1/allowance/:id**: Read one allowance
//! - **POST /allowance/api/v1/allowance**: Create an allowance
//! - **PUT /allowance/api/v1/allowance/:id**: Partially update an allowance
//! - **DELETE /allowance/api/v1/allowance/:id**: Delete an allowance
//! - **GET /allowance/api/v1/health**: Liveness probe

pub mod rest;

pub use rest::*;
