//! Persisted route records and the `match => filter` split.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Separator between the match half and the filter half of a rule.
pub const RULE_SEPARATOR: &str = " => ";

/// Filter rule that rejects every provider once the match half holds.
pub const DENY_ALL_FILTER: &str = "false";

/// A stored `rule` that does not split into exactly two halves.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("illegal route condition rule \"{rule}\" for service {service}: expected exactly one '=>'")]
pub struct MalformedRuleError {
    pub service: String,
    pub rule: String,
}

/// A route as held by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRecord {
    /// Store identity, absent until the record is created.
    #[serde(default)]
    pub id: Option<u64>,

    /// Owning service, the lookup key.
    pub service: String,

    /// Canonical `"<match rule> => <filter rule>"` text.
    pub rule: String,

    /// Force routes apply even when no provider survives the filter.
    #[serde(default)]
    pub force: bool,

    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub name: String,
}

impl RouteRecord {
    /// A fresh, unsaved force route for an access list on `service`.
    pub fn new_access_list(service: impl Into<String>) -> Self {
        let service = service.into();
        let parts = RuleParts {
            match_rule: String::new(),
            filter_rule: DENY_ALL_FILTER.to_string(),
        };
        Self {
            id: None,
            name: format!("{} blackwhitelist", service),
            service,
            rule: parts.combine(),
            force: true,
            enabled: true,
        }
    }

    /// Split `rule` into its match and filter halves.
    pub fn split(&self) -> Result<RuleParts, MalformedRuleError> {
        let mut halves = self.rule.split(RULE_SEPARATOR);
        match (halves.next(), halves.next(), halves.next()) {
            (Some(match_rule), Some(filter_rule), None) => Ok(RuleParts {
                match_rule: match_rule.to_string(),
                filter_rule: filter_rule.to_string(),
            }),
            _ => Err(MalformedRuleError {
                service: self.service.clone(),
                rule: self.rule.clone(),
            }),
        }
    }

    /// Replace `rule` with the recombined halves.
    pub fn set_parts(&mut self, parts: &RuleParts) {
        self.rule = parts.combine();
    }
}

/// Transient match/filter halves of a route rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleParts {
    pub match_rule: String,
    pub filter_rule: String,
}

impl RuleParts {
    pub fn combine(&self) -> String {
        format!("{}{}{}", self.match_rule, RULE_SEPARATOR, self.filter_rule)
    }
}
