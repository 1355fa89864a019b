//! CLA bot allowlisting
//!
//! Decides which commit actors are exempted from Contributor License
//! Agreement enforcement by an organization's `skip_cla` configuration.
//!
//! ## Features
//!
//! - **Rule matching** on login, email and name with exact, `re:` regex and
//!   `*` wildcard sub-patterns, plus `[..||..]` alternatives
//! - **Repository precedence**: exact name, then `re:` keys, then `*`
//! - **Audit events** for every exemption through a pluggable sink
//! - **Two transports**: JSON lines over stdio, or an HTTP API
//!
//! ## Example `skip_cla`
//!
//! ```json
//! {
//!     "infra-tools": "dependabot[bot];*;*",
//!     "re:^docs-": "[re:-bot$;*;*||;noreply@example.com;]",
//!     "*": "renovate[bot]"
//! }
//! ```
//!
//! ## Example Configuration
//!
//! ```toml
//! [server]
//! transport = "http"
//! port = 20290
//!
//! [allowlist]
//! grammar = "extended"            # or "simple" for legacy login;email rules
//!
//! [store]
//! organizations_path = "organizations.json"
//! ```

pub mod allowlist;
pub mod config;
pub mod error;
pub mod events;
pub mod metrics;
pub mod server;
pub mod store;
pub mod transport;

// Re-export main types
pub use allowlist::{AllowlistDecision, AllowlistResolver, SkipClaConfig, UserCommitSummary};
pub use config::{AppConfig, load_config};
pub use error::{AppError, Result};
pub use server::AllowlistService;
