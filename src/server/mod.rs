//! Service module
//!
//! The transport-independent allowlist service.

pub mod handler;
pub mod types;

pub use handler::AllowlistService;
pub use types::{AllowlistRequest, AllowlistResponse};
