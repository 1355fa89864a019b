//! Allowlist types
//!
//! Records consumed and produced by the allowlist matcher.

use crate::events::LogEventArgs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Key in a `skip_cla` map that applies to every repository of the organization
pub const WILDCARD_KEY: &str = "*";

/// Prefix marking a `skip_cla` key or sub-pattern as a regular expression
pub const REGEX_PREFIX: &str = "re:";

/// Commit author identity as reported by the code-hosting platform
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitAuthor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A commit actor that is being checked for CLA coverage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCommitSummary {
    /// Commit SHA the actor was collected from
    #[serde(default)]
    pub sha: String,

    /// Author record, absent when the platform could not resolve the author
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_author: Option<CommitAuthor>,

    /// Whether the actor is affiliated with a company that signed a CCLA
    #[serde(default)]
    pub affiliated: bool,

    /// Set when the actor is covered, either by a signature or by `skip_cla`
    #[serde(default)]
    pub authorized: bool,
}

impl UserCommitSummary {
    /// Build an actor from optional login, email and name
    pub fn new(login: Option<&str>, email: Option<&str>, name: Option<&str>) -> Self {
        Self {
            commit_author: Some(CommitAuthor {
                id: None,
                login: login.map(String::from),
                email: email.map(String::from),
                name: name.map(String::from),
            }),
            ..Default::default()
        }
    }

    /// Attach a numeric platform id
    pub fn with_id(mut self, id: i64) -> Self {
        self.commit_author.get_or_insert_with(Default::default).id = Some(id);
        self
    }

    /// Login, or `""` when missing
    pub fn login(&self) -> &str {
        self.author_field(|a| a.login.as_deref())
    }

    /// Email, or `""` when missing
    pub fn email(&self) -> &str {
        self.author_field(|a| a.email.as_deref())
    }

    /// Display name, or `""` when missing
    pub fn name(&self) -> &str {
        self.author_field(|a| a.name.as_deref())
    }

    fn author_field<'a>(&'a self, f: impl Fn(&'a CommitAuthor) -> Option<&'a str>) -> &'a str {
        self.commit_author.as_ref().and_then(f).unwrap_or("")
    }
}

/// Human-readable actor description used in logs and audit events
impl fmt::Display for UserCommitSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NULL: &str = "(null)";
        let author = self.commit_author.as_ref();
        let id = author
            .and_then(|a| a.id)
            .map(|id| id.to_string())
            .unwrap_or_else(|| NULL.to_string());
        let login = author.and_then(|a| a.login.as_deref()).unwrap_or(NULL);
        let name = author.and_then(|a| a.name.as_deref()).unwrap_or(NULL);
        let email = author.and_then(|a| a.email.as_deref()).unwrap_or(NULL);
        write!(
            f,
            "id='{}',login='{}',username='{}',email='{}'",
            id, login, name, email
        )
    }
}

/// Per-organization `skip_cla` map: repository match key to rule value
///
/// Backed by a `BTreeMap` so regex keys are visited in lexicographic order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkipClaConfig(BTreeMap<String, String>);

impl SkipClaConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `re:` keys in lexicographic order, yielding (key, regex source, value)
    pub fn regex_keys(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.iter().filter_map(|(k, v)| {
            k.strip_prefix(REGEX_PREFIX)
                .map(|pattern| (k, pattern, v))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SkipClaConfig {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// GitHub organization record as stored by the CLA platform
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubOrganization {
    pub organization_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_cla: Option<SkipClaConfig>,
}

impl GithubOrganization {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            organization_name: name.into(),
            skip_cla: None,
        }
    }

    pub fn with_skip_cla(mut self, skip_cla: SkipClaConfig) -> Self {
        self.skip_cla = Some(skip_cla);
        self
    }
}

/// Which precedence level supplied the rule value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    /// Key equal to the repository name
    Exact,
    /// `re:` key whose regex matched the repository name
    Regex,
    /// The `*` key
    Wildcard,
}

impl MatchSource {
    pub const fn as_str(&self) -> &'static str {
        match self {
            MatchSource::Exact => "exact",
            MatchSource::Regex => "regex",
            MatchSource::Wildcard => "wildcard",
        }
    }
}

impl fmt::Display for MatchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The `skip_cla` entry selected for a repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedConfig {
    pub key: String,
    pub value: String,
    pub source: MatchSource,
}

/// Outcome of an allowlist check
///
/// Every non-nil input actor lands in exactly one of the two lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AllowlistDecision {
    /// Actors that still need to sign a CLA, in input order
    pub still_missing: Vec<UserCommitSummary>,
    /// Actors exempted by `skip_cla`, in input order, with `authorized` set
    pub allowlisted: Vec<UserCommitSummary>,
    /// The `skip_cla` entry that applied, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<ResolvedConfig>,
    /// One audit event per allowlisted actor
    pub events: Vec<LogEventArgs>,
}

impl AllowlistDecision {
    /// Decision that filters nothing
    pub fn passthrough(actors: Vec<UserCommitSummary>) -> Self {
        Self {
            still_missing: actors,
            ..Default::default()
        }
    }

    /// Consume the decision into (still missing, allowlisted)
    pub fn into_parts(self) -> (Vec<UserCommitSummary>, Vec<UserCommitSummary>) {
        (self.still_missing, self.allowlisted)
    }
}
