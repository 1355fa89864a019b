//! Allowlist resolver
//!
//! Decides which commit actors are exempted from CLA enforcement by an
//! organization's `skip_cla` map. The entry that applies to a repository is
//! chosen with the following precedence (highest to lowest):
//! 1. Key equal to the repository name (organization prefix stripped)
//! 2. First `re:` key, in lexicographic key order, whose regex matches
//! 3. The `*` key
//!
//! When no entry applies, nothing is filtered and no events are emitted.
//! An entry with an empty value counts as absent; a matching regex key with
//! an empty value ends the regex scan and defers to `*`.

use crate::allowlist::patterns::PatternCache;
use crate::allowlist::rules::{Grammar, Rule, split_alternatives};
use crate::allowlist::types::{
    AllowlistDecision, GithubOrganization, MatchSource, REGEX_PREFIX, ResolvedConfig,
    SkipClaConfig, UserCommitSummary, WILDCARD_KEY,
};
use crate::config::AllowlistConfig;
use crate::error::ConfigError;
use crate::events::{BypassClaEventData, EventSink, LogEventArgs};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where compiled regexes live
enum CacheHandle {
    Global,
    Owned(PatternCache),
}

/// Applies `skip_cla` rules to commit actors
pub struct AllowlistResolver {
    grammar: Grammar,
    cache: CacheHandle,
    sink: Arc<dyn EventSink>,
}

impl AllowlistResolver {
    /// Create a resolver from configuration
    ///
    /// With `cache_patterns` enabled the process-wide [`PatternCache`] is
    /// shared; otherwise every regex is compiled on use.
    pub fn new(config: &AllowlistConfig, sink: Arc<dyn EventSink>) -> Self {
        let cache = if config.cache_patterns {
            CacheHandle::Global
        } else {
            CacheHandle::Owned(PatternCache::disabled())
        };
        Self {
            grammar: config.grammar,
            cache,
            sink,
        }
    }

    /// Create a resolver with its own private pattern cache
    pub fn with_cache(grammar: Grammar, cache: PatternCache, sink: Arc<dyn EventSink>) -> Self {
        Self {
            grammar,
            cache: CacheHandle::Owned(cache),
            sink,
        }
    }

    pub fn grammar(&self) -> Grammar {
        self.grammar
    }

    pub fn cache(&self) -> &PatternCache {
        match &self.cache {
            CacheHandle::Global => PatternCache::global(),
            CacheHandle::Owned(cache) => cache,
        }
    }

    /// Check actors against an organization record
    pub fn skip_allowlisted_bots(
        &self,
        org: &GithubOrganization,
        org_repo: &str,
        project_id: &str,
        actors_missing_cla: Vec<Option<UserCommitSummary>>,
    ) -> AllowlistDecision {
        self.resolve(
            org.skip_cla.as_ref(),
            org_repo,
            project_id,
            actors_missing_cla,
        )
    }

    /// Partition actors into still-missing and allowlisted
    ///
    /// `None` actors are dropped from both lists. Allowlisted actors get
    /// `authorized = true` and one audit event each, sent to the sink and
    /// recorded in the decision.
    pub fn resolve(
        &self,
        skip_cla: Option<&SkipClaConfig>,
        org_repo: &str,
        project_id: &str,
        actors_missing_cla: Vec<Option<UserCommitSummary>>,
    ) -> AllowlistDecision {
        let repo = strip_org(org_repo);
        let actors: Vec<UserCommitSummary> = actors_missing_cla.into_iter().flatten().collect();

        let Some(skip_cla) = skip_cla else {
            debug!(org_repo, project_id, "skip_cla is not set, skipping allowlisted bots check");
            return AllowlistDecision::passthrough(actors);
        };

        let Some(resolved) = self.resolve_config(skip_cla, repo) else {
            debug!(
                org_repo,
                repo,
                project_id,
                "no skip_cla config found for repo, skipping allowlisted bots check"
            );
            return AllowlistDecision::passthrough(actors);
        };

        let rule = Rule::parse(self.grammar, &resolved.value);
        debug!(
            org_repo,
            project_id,
            key = %resolved.key,
            source = %resolved.source,
            rule = %rule,
            actors = %describe_all(&actors),
            "final skip_cla config for repo"
        );

        let cache = self.cache();
        let config_value = resolved.value.clone();
        let mut decision = AllowlistDecision {
            resolved: Some(resolved),
            ..Default::default()
        };

        for mut actor in actors {
            let description = actor.to_string();
            debug!(org_repo, actor = %description, "checking actor against skip_cla");

            if !rule.matches(&actor, cache) {
                decision.still_missing.push(actor);
                continue;
            }

            info!(
                org_repo,
                project_id,
                actor = %description,
                rule = %rule,
                "skipping CLA check for actor due to skip_cla config"
            );
            let event = LogEventArgs::bypass_cla(
                BypassClaEventData {
                    repo: org_repo.to_string(),
                    config: config_value.clone(),
                    actor: description,
                },
                project_id,
            );
            self.sink.log_event(&event);
            decision.events.push(event);

            actor.authorized = true;
            decision.allowlisted.push(actor);
        }

        decision
    }

    /// Select the `skip_cla` entry for a repository name (without org prefix)
    pub fn resolve_config(&self, skip_cla: &SkipClaConfig, repo: &str) -> Option<ResolvedConfig> {
        if let Some(value) = skip_cla.get(repo).filter(|v| !v.is_empty()) {
            debug!(repo, value, "skip_cla config found for repo (exact hit)");
            return Some(ResolvedConfig {
                key: repo.to_string(),
                value: value.to_string(),
                source: MatchSource::Exact,
            });
        }

        let cache = self.cache();
        for (key, pattern, value) in skip_cla.regex_keys() {
            let re = match cache.compile(pattern) {
                Ok(re) => re,
                Err(e) => {
                    warn!(repo, key, error = %e, "invalid regex in skip_cla key");
                    continue;
                }
            };
            if re.is_match(repo) {
                if value.is_empty() {
                    break;
                }
                debug!(repo, key, value, "found skip_cla config for repo via regex key");
                return Some(ResolvedConfig {
                    key: key.to_string(),
                    value: value.to_string(),
                    source: MatchSource::Regex,
                });
            }
        }

        if let Some(value) = skip_cla.get(WILDCARD_KEY).filter(|v| !v.is_empty()) {
            debug!(repo, value, "using wildcard skip_cla config");
            return Some(ResolvedConfig {
                key: WILDCARD_KEY.to_string(),
                value: value.to_string(),
                source: MatchSource::Wildcard,
            });
        }

        None
    }
}

/// Remove the organization part of `org/repo`
///
/// Returns the input unchanged when there is no `/` or nothing follows it.
pub fn strip_org(org_repo: &str) -> &str {
    match org_repo.split_once('/') {
        Some((_, repo)) if !repo.is_empty() => repo,
        _ => org_repo,
    }
}

/// Report every invalid regex in a `skip_cla` map, keys and sub-patterns alike
pub fn lint_skip_cla(skip_cla: &SkipClaConfig) -> Vec<ConfigError> {
    let cache = PatternCache::disabled();
    let mut problems = Vec::new();

    for (key, value) in skip_cla.iter() {
        if let Some(pattern) = key.strip_prefix(REGEX_PREFIX)
            && let Err(e) = cache.compile(pattern)
        {
            problems.push(e);
        }

        for alternative in split_alternatives(value) {
            for part in alternative.split(';') {
                if let Some(expr) = part.strip_prefix(REGEX_PREFIX)
                    && let Err(e) = cache.compile(expr)
                {
                    problems.push(e);
                }
            }
        }
    }

    problems
}

fn describe_all(actors: &[UserCommitSummary]) -> String {
    let parts: Vec<String> = actors.iter().map(|a| a.to_string()).collect();
    format!("[{}]", parts.join(", "))
}
