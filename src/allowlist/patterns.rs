//! Sub-pattern matching for `skip_cla` rules
//!
//! A sub-pattern constrains one actor property (login, email or name):
//! - `*` matches anything, including a missing value
//! - `` (empty) matches only a missing or empty value
//! - `re:<expr>` matches a non-empty value by regex search
//! - anything else matches a non-empty value exactly
//!
//! Regexes are compiled through a [`PatternCache`] so the same pattern text is
//! compiled once per process instead of once per call.

use crate::allowlist::types::REGEX_PREFIX;
use crate::error::ConfigError;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::{OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, warn};

/// One parsed sub-pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyPattern {
    /// `*`
    Any,
    /// empty pattern
    Empty,
    /// `re:<expr>`, holding the expression without prefix
    Regex(String),
    /// literal value
    Exact(String),
}

impl PropertyPattern {
    pub fn parse(pattern: &str) -> Self {
        if pattern == "*" {
            PropertyPattern::Any
        } else if pattern.is_empty() {
            PropertyPattern::Empty
        } else if let Some(expr) = pattern.strip_prefix(REGEX_PREFIX) {
            PropertyPattern::Regex(expr.to_string())
        } else {
            PropertyPattern::Exact(pattern.to_string())
        }
    }

    /// Check an actor property value against this pattern
    ///
    /// Missing properties must already be normalized to `""`.
    pub fn matches(&self, value: &str, cache: &PatternCache) -> bool {
        match self {
            PropertyPattern::Any => true,
            PropertyPattern::Empty => value.is_empty(),
            _ if value.is_empty() => false,
            PropertyPattern::Regex(expr) => cache.is_match(expr, value),
            PropertyPattern::Exact(literal) => literal == value,
        }
    }

    /// Like [`matches`](Self::matches), but `*` requires a non-empty value
    pub fn matches_present(&self, value: &str, cache: &PatternCache) -> bool {
        match self {
            PropertyPattern::Any => !value.is_empty(),
            other => other.matches(value, cache),
        }
    }
}

impl fmt::Display for PropertyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyPattern::Any => write!(f, "*"),
            PropertyPattern::Empty => Ok(()),
            PropertyPattern::Regex(expr) => write!(f, "{}{}", REGEX_PREFIX, expr),
            PropertyPattern::Exact(literal) => write!(f, "{}", literal),
        }
    }
}

/// Cache of compiled regexes keyed by pattern text
///
/// Failed compilations are cached too, so a broken pattern is reported once
/// and then treated as a non-match. Call [`clear`](Self::clear) when the
/// `skip_cla` configuration is reloaded.
#[derive(Debug)]
pub struct PatternCache {
    enabled: bool,
    entries: RwLock<HashMap<String, Result<Regex, regex::Error>>>,
}

impl PatternCache {
    pub fn new() -> Self {
        Self {
            enabled: true,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// A cache that compiles every pattern on each use
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Process-wide cache shared by all resolvers that opt into it
    pub fn global() -> &'static PatternCache {
        static GLOBAL: OnceLock<PatternCache> = OnceLock::new();
        GLOBAL.get_or_init(PatternCache::new)
    }

    fn write_entries(&self) -> RwLockWriteGuard<'_, HashMap<String, Result<Regex, regex::Error>>> {
        self.entries.write().unwrap_or_else(|poisoned| {
            warn!("pattern cache lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn read_entries(&self) -> RwLockReadGuard<'_, HashMap<String, Result<Regex, regex::Error>>> {
        self.entries.read().unwrap_or_else(|poisoned| {
            warn!("pattern cache lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Compile a regex, reusing a cached result when available
    pub fn compile(&self, pattern: &str) -> Result<Regex, ConfigError> {
        if !self.enabled {
            return Regex::new(pattern).map_err(|e| ConfigError::invalid_pattern(pattern, &e));
        }

        if let Some(cached) = self.read_entries().get(pattern) {
            return cached
                .clone()
                .map_err(|e| ConfigError::invalid_pattern(pattern, &e));
        }

        let compiled = Regex::new(pattern);
        let result = compiled
            .clone()
            .map_err(|e| ConfigError::invalid_pattern(pattern, &e));
        self.write_entries().insert(pattern.to_string(), compiled);
        result
    }

    /// Regex search of `value`; an invalid pattern never matches
    pub fn is_match(&self, pattern: &str, value: &str) -> bool {
        match self.compile(pattern) {
            Ok(re) => re.is_match(value),
            Err(e) => {
                debug!(pattern, value, error = %e, "bad regexp in skip_cla pattern");
                false
            }
        }
    }

    /// Drop every cached compilation
    pub fn clear(&self) {
        self.write_entries().clear();
    }

    pub fn len(&self) -> usize {
        self.read_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_entries().is_empty()
    }
}

impl Default for PatternCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(PropertyPattern::parse("*"), PropertyPattern::Any);
        assert_eq!(PropertyPattern::parse(""), PropertyPattern::Empty);
        assert_eq!(
            PropertyPattern::parse("re:^bot-"),
            PropertyPattern::Regex("^bot-".into())
        );
        assert_eq!(
            PropertyPattern::parse("renovate"),
            PropertyPattern::Exact("renovate".into())
        );
    }

    #[test]
    fn test_wildcard_matches_everything() {
        let cache = PatternCache::new();
        assert!(PropertyPattern::Any.matches("", &cache));
        assert!(PropertyPattern::Any.matches("anyone", &cache));
    }

    #[test]
    fn test_empty_matches_only_empty() {
        let cache = PatternCache::new();
        assert!(PropertyPattern::Empty.matches("", &cache));
        assert!(!PropertyPattern::Empty.matches("x", &cache));
    }

    #[test]
    fn test_non_empty_patterns_reject_empty_value() {
        let cache = PatternCache::new();
        assert!(!PropertyPattern::parse("re:.*").matches("", &cache));
        assert!(!PropertyPattern::parse("bot").matches("", &cache));
    }

    #[test]
    fn test_regex_uses_search_semantics() {
        let cache = PatternCache::new();
        let p = PropertyPattern::parse("re:bot");
        assert!(p.matches("my-bot-account", &cache));
        assert!(!p.matches("human", &cache));

        let anchored = PropertyPattern::parse("re:^bot$");
        assert!(!anchored.matches("my-bot", &cache));
        assert!(anchored.matches("bot", &cache));
    }

    #[test]
    fn test_exact_is_case_sensitive() {
        let cache = PatternCache::new();
        let p = PropertyPattern::parse("Renovate");
        assert!(p.matches("Renovate", &cache));
        assert!(!p.matches("renovate", &cache));
    }

    #[test]
    fn test_invalid_regex_never_matches() {
        let cache = PatternCache::new();
        let p = PropertyPattern::parse("re:[unclosed");
        assert!(!p.matches("[unclosed", &cache));
        assert!(matches!(
            cache.compile("[unclosed"),
            Err(ConfigError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_matches_present_requires_value_for_wildcard() {
        let cache = PatternCache::new();
        assert!(!PropertyPattern::Any.matches_present("", &cache));
        assert!(PropertyPattern::Any.matches_present("x", &cache));
        assert!(PropertyPattern::Empty.matches_present("", &cache));
    }

    #[test]
    fn test_cache_reuses_and_clears() {
        let cache = PatternCache::new();
        assert!(cache.is_empty());
        assert!(cache.is_match("^a", "abc"));
        assert!(cache.is_match("^a", "axe"));
        assert!(!cache.is_match("[bad", "x"));
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_disabled_cache_stores_nothing() {
        let cache = PatternCache::disabled();
        assert!(cache.is_match("^a", "abc"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_display_round_trips_source_text() {
        for source in ["*", "", "re:^bot", "alice"] {
            assert_eq!(PropertyPattern::parse(source).to_string(), source);
        }
    }
}
