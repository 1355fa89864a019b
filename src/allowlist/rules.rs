//! `skip_cla` rule grammar
//!
//! Two grammars exist for the value side of a `skip_cla` entry:
//!
//! - **extended** (default): `<login>;<email>;<name>`, or a list of such
//!   triples written as `[<p1>||<p2>||...]`. Missing parts default to the
//!   empty pattern.
//! - **simple** (legacy): `<login>;<email>`, no lists. `*` needs a non-empty
//!   value, and an actor without a login never matches.
//!
//! Both parse into [`Rule`] so the resolver has a single code path.

use crate::allowlist::patterns::{PatternCache, PropertyPattern};
use crate::allowlist::types::UserCommitSummary;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Grammar used to interpret `skip_cla` values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grammar {
    /// Three-part patterns with `[..||..]` alternation
    #[default]
    Extended,
    /// Two-part legacy patterns
    Simple,
}

impl Grammar {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Grammar::Extended => "extended",
            Grammar::Simple => "simple",
        }
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Login, email and name sub-patterns of one alternative
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternTriple {
    pub login: PropertyPattern,
    pub email: PropertyPattern,
    pub name: PropertyPattern,
}

impl PatternTriple {
    /// Parse `<login>;<email>;<name>`, padding missing parts with ``
    pub fn parse(pattern: &str) -> Self {
        let mut parts = pattern.split(';');
        let mut next = || PropertyPattern::parse(parts.next().unwrap_or(""));
        let login = next();
        let email = next();
        let name = next();
        Self { login, email, name }
    }

    pub fn matches(&self, actor: &UserCommitSummary, cache: &PatternCache) -> bool {
        self.login.matches(actor.login(), cache)
            && self.email.matches(actor.email(), cache)
            && self.name.matches(actor.name(), cache)
    }
}

impl fmt::Display for PatternTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{};{}", self.login, self.email, self.name)
    }
}

/// A parsed `skip_cla` value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    Simple {
        login: PropertyPattern,
        /// `None` when the value has no email part
        email: Option<PropertyPattern>,
    },
    Extended {
        alternatives: Vec<PatternTriple>,
    },
}

impl Rule {
    pub fn parse(grammar: Grammar, value: &str) -> Self {
        match grammar {
            Grammar::Extended => Rule::Extended {
                alternatives: split_alternatives(value)
                    .into_iter()
                    .map(PatternTriple::parse)
                    .collect(),
            },
            Grammar::Simple => {
                let mut parts = value.trim().split(';');
                let login = PropertyPattern::parse(parts.next().unwrap_or(""));
                let email = parts.next().map(PropertyPattern::parse);
                Rule::Simple { login, email }
            }
        }
    }

    /// Whether the actor is exempted by this rule
    pub fn matches(&self, actor: &UserCommitSummary, cache: &PatternCache) -> bool {
        match self {
            Rule::Extended { alternatives } => alternatives.iter().any(|alt| alt.matches(actor, cache)),
            Rule::Simple { login, email } => {
                let actor_login = actor.login();
                if actor_login.is_empty() || !login.matches_present(actor_login, cache) {
                    return false;
                }
                email
                    .as_ref()
                    .is_none_or(|p| p.matches_present(actor.email(), cache))
            }
        }
    }

    pub fn grammar(&self) -> Grammar {
        match self {
            Rule::Simple { .. } => Grammar::Simple,
            Rule::Extended { .. } => Grammar::Extended,
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Simple { login, email: None } => write!(f, "{}", login),
            Rule::Simple {
                login,
                email: Some(email),
            } => write!(f, "{};{}", login, email),
            Rule::Extended { alternatives } => {
                let joined: Vec<String> = alternatives.iter().map(|a| a.to_string()).collect();
                write!(f, "[{}]", joined.join(" || "))
            }
        }
    }
}

/// Split a value into its alternatives
///
/// `[a||b]` yields `["a", "b"]` with each part trimmed; any other value is a
/// single alternative.
pub fn split_alternatives(value: &str) -> Vec<&str> {
    let value = value.trim();
    match value
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
    {
        Some(inner) => inner.split("||").map(str::trim).collect(),
        None => vec![value],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(login: Option<&str>, email: Option<&str>, name: Option<&str>) -> UserCommitSummary {
        UserCommitSummary::new(login, email, name)
    }

    #[test]
    fn test_extended_is_default_grammar() {
        assert_eq!(Grammar::default(), Grammar::Extended);
    }

    #[test]
    fn test_split_alternatives() {
        assert_eq!(split_alternatives("a;;"), vec!["a;;"]);
        assert_eq!(split_alternatives(" [a;; || b;c;] "), vec!["a;;", "b;c;"]);
        assert_eq!(split_alternatives("[]"), vec![""]);
        assert_eq!(split_alternatives("[a"), vec!["[a"]);
    }

    #[test]
    fn test_triple_pads_missing_parts() {
        let t = PatternTriple::parse("bot");
        assert_eq!(t.login, PropertyPattern::Exact("bot".into()));
        assert_eq!(t.email, PropertyPattern::Empty);
        assert_eq!(t.name, PropertyPattern::Empty);
    }

    #[test]
    fn test_triple_ignores_extra_parts() {
        let t = PatternTriple::parse("a;b;c;d");
        assert_eq!(t.name, PropertyPattern::Exact("c".into()));
    }

    #[test]
    fn test_extended_login_only_requires_empty_email_and_name() {
        let cache = PatternCache::new();
        let rule = Rule::parse(Grammar::Extended, "bot");
        assert!(rule.matches(&actor(Some("bot"), None, None), &cache));
        assert!(!rule.matches(&actor(Some("bot"), Some("bot@x.io"), None), &cache));
    }

    #[test]
    fn test_extended_alternatives() {
        let cache = PatternCache::new();
        let rule = Rule::parse(Grammar::Extended, "[alice;*;*||re:^bob;*;*]");
        assert!(rule.matches(&actor(Some("alice"), Some("a@x.io"), None), &cache));
        assert!(rule.matches(&actor(Some("bobby"), None, Some("Bob")), &cache));
        assert!(!rule.matches(&actor(Some("carol"), None, None), &cache));
    }

    #[test]
    fn test_extended_wildcard_matches_missing_login() {
        let cache = PatternCache::new();
        let rule = Rule::parse(Grammar::Extended, "*;re:@bots\\.example\\.com$;*");
        assert!(rule.matches(&actor(None, Some("ci@bots.example.com"), None), &cache));
    }

    #[test]
    fn test_simple_requires_login() {
        let cache = PatternCache::new();
        let rule = Rule::parse(Grammar::Simple, "*");
        assert!(rule.matches(&actor(Some("anyone"), None, None), &cache));
        assert!(!rule.matches(&actor(None, Some("a@x.io"), None), &cache));
    }

    #[test]
    fn test_simple_wildcard_email_requires_value() {
        let cache = PatternCache::new();
        let rule = Rule::parse(Grammar::Simple, "re:bot;*");
        assert!(rule.matches(&actor(Some("my-bot"), Some("b@x.io"), None), &cache));
        assert!(!rule.matches(&actor(Some("my-bot"), None, None), &cache));
    }

    #[test]
    fn test_simple_has_no_alternation() {
        let cache = PatternCache::new();
        let rule = Rule::parse(Grammar::Simple, "[alice||bob]");
        assert!(!rule.matches(&actor(Some("alice"), None, None), &cache));
        assert_eq!(rule.grammar(), Grammar::Simple);
    }

    #[test]
    fn test_grammars_disagree_on_missing_login() {
        let cache = PatternCache::new();
        let nameless = actor(None, None, None);
        assert!(Rule::parse(Grammar::Extended, "*;*;*").matches(&nameless, &cache));
        assert!(!Rule::parse(Grammar::Simple, "*;*").matches(&nameless, &cache));
    }

    #[test]
    fn test_rule_display() {
        assert_eq!(
            Rule::parse(Grammar::Extended, "[a;;||b;*;re:x]").to_string(),
            "[a;; || b;*;re:x]"
        );
        assert_eq!(Rule::parse(Grammar::Simple, "bot;*").to_string(), "bot;*");
    }
}
