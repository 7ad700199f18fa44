//! Replaunch shared types.
//!
//! This crate contains the types shared between the launcher library
//! and the command-line frontend: errors, endpoint addressing, and
//! protocol constants.

pub mod constants;
pub mod endpoint;
pub mod errors;

pub use endpoint::Endpoint;
pub use errors::{LaunchError, LaunchResult};
