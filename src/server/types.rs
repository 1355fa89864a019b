//! Request and response bodies shared by all transports

use crate::allowlist::{AllowlistDecision, ResolvedConfig, UserCommitSummary};
use crate::events::LogEventArgs;
use serde::{Deserialize, Serialize};

/// An allowlist check request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllowlistRequest {
    /// GitHub organization; derived from `repository` when omitted
    #[serde(default)]
    pub organization: Option<String>,

    /// Repository in `org/repo` form
    pub repository: String,

    /// CLA Group the repository belongs to, attached to audit events
    #[serde(default)]
    pub project_id: String,

    /// Actors missing a CLA; `null` entries are ignored
    #[serde(default)]
    pub actors: Vec<Option<UserCommitSummary>>,
}

impl AllowlistRequest {
    /// Organization to look up, falling back to the `org/` prefix of the repository
    pub fn organization_name(&self) -> Option<&str> {
        match self.organization.as_deref() {
            Some(org) if !org.is_empty() => Some(org),
            _ => self
                .repository
                .split_once('/')
                .map(|(org, _)| org)
                .filter(|org| !org.is_empty()),
        }
    }
}

/// An allowlist check response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowlistResponse {
    pub still_missing: Vec<UserCommitSummary>,
    pub allowlisted: Vec<UserCommitSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved: Option<ResolvedConfig>,
    #[serde(default)]
    pub events: Vec<LogEventArgs>,
}

impl From<AllowlistDecision> for AllowlistResponse {
    fn from(decision: AllowlistDecision) -> Self {
        Self {
            still_missing: decision.still_missing,
            allowlisted: decision.allowlisted,
            resolved: decision.resolved,
            events: decision.events,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_organization_from_repository() {
        let req = AllowlistRequest {
            repository: "acme/widgets".into(),
            ..Default::default()
        };
        assert_eq!(req.organization_name(), Some("acme"));
    }

    #[test]
    fn test_explicit_organization_wins() {
        let req = AllowlistRequest {
            organization: Some("other".into()),
            repository: "acme/widgets".into(),
            ..Default::default()
        };
        assert_eq!(req.organization_name(), Some("other"));
    }

    #[test]
    fn test_no_organization() {
        let req = AllowlistRequest {
            repository: "widgets".into(),
            ..Default::default()
        };
        assert_eq!(req.organization_name(), None);
    }

    #[test]
    fn test_null_actors_deserialize() {
        let req: AllowlistRequest = serde_json::from_str(
            r#"{"repository":"a/b","actors":[null,{"commit_author":{"login":"x"}}]}"#,
        )
        .unwrap();
        assert_eq!(req.actors.len(), 2);
        assert!(req.actors[0].is_none());
        assert_eq!(req.actors[1].as_ref().unwrap().login(), "x");
    }
}
