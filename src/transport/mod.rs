//! Transport module
//!
//! Provides different transport implementations for the allowlist service.

pub mod http;
pub mod stdio;

pub use http::{DEFAULT_HTTP_PORT, HttpConfig, REQUEST_ID_HEADER, router, run_http};
pub use stdio::{run_stdio, serve_lines};
