//! Allowlist module
//!
//! Decides whether commit actors (typically bots and service accounts) are
//! exempted from CLA enforcement by an organization's `skip_cla` map.
//!
//! ## `skip_cla` format
//!
//! ```json
//! {
//!     "repo-name": "<login>;<email>;<name>",
//!     "re:repo-regexp": "[<login>;<email>;<name>||...]",
//!     "*": "<login>"
//! }
//! ```
//!
//! - keys are an exact repository name without the organization prefix, a
//!   `re:` regex tested against the repository name, or `*` for any repository
//! - each sub-pattern is `*` (anything), empty (missing or empty value),
//!   `re:<expr>` (regex search) or an exact value
//! - a bracketed `[..||..]` value lists alternatives; any one may match
//!
//! See [`resolver`] for precedence and [`rules`] for the legacy grammar.

pub mod patterns;
pub mod resolver;
pub mod rules;
pub mod types;

pub use patterns::{PatternCache, PropertyPattern};
pub use resolver::{AllowlistResolver, lint_skip_cla, strip_org};
pub use rules::{Grammar, PatternTriple, Rule};
pub use types::{
    AllowlistDecision, CommitAuthor, GithubOrganization, MatchSource, ResolvedConfig,
    SkipClaConfig, UserCommitSummary,
};
