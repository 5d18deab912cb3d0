//! Domain models for the Smart Farm client

mod farm;
mod feedback;
mod field;
mod live;
mod seed;
mod user;

pub use farm::*;
pub use feedback::*;
pub use field::*;
pub use live::*;
pub use seed::*;
pub use user::*;
