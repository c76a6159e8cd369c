//! Data models for the plane spotter service.

mod badge;
mod credential;
mod flight;

pub use badge::*;
pub use credential::*;
pub use flight::*;
