//! Shared types and models for the Smart Farm client
//!
//! This crate contains the pure data layer shared between the client runtime
//! and the browser (via WASM): domain models, growth-rule tables and the
//! date/seed validators. No I/O and no async code lives here.

pub mod growth;
pub mod models;
pub mod types;
pub mod validation;

pub use growth::*;
pub use models::*;
pub use types::*;
pub use validation::*;
