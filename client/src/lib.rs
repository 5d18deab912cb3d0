//! Smart Farm client core
//!
//! The runtime half of the client: farm/user context, field lifecycle
//! control and live feed synchronization. All I/O goes through the
//! collaborator traits in [`collaborators`], so the components here can be
//! driven by the real HTTP/WebSocket collaborators or by test doubles.
#![allow(async_fn_in_trait)]

pub mod collaborators;
pub mod config;
pub mod context;
pub mod error;
pub mod feed;
pub mod fields;
pub mod store;

pub use error::{AppError, AppResult};
