//! Relationship model shared by the IAM runtime contracts.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The resolved identity behind a credential.
///
/// Produced only by the authentication contract. The authorization contract
/// never resolves a subject on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    /// Opaque, stable subject identifier.
    pub subject_id: String,
    /// Unordered claims carried by the credential (e.g. `aud`).
    #[serde(default)]
    pub claims: HashMap<String, serde_json::Value>,
}

impl Subject {
    #[must_use]
    pub fn new(subject_id: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            claims: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_claim(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.claims.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn claim(&self, key: &str) -> Option<&serde_json::Value> {
        self.claims.get(key)
    }
}

/// Outcome of a backend credential lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum CredentialValidation {
    Valid(Subject),
    Invalid,
}

/// A single `(action, resource_id)` pair of an access check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessRequestAction {
    /// The verb the subject wants to perform (e.g. "greet").
    pub action: String,
    /// The object the action targets.
    pub resource_id: String,
}

impl AccessRequestAction {
    #[must_use]
    pub fn new(action: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            resource_id: resource_id.into(),
        }
    }
}

impl fmt::Display for AccessRequestAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {}", self.action, self.resource_id)
    }
}

/// Allow/deny outcome of evaluating actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessDecision {
    Allowed,
    Denied,
}

impl AccessDecision {
    #[must_use]
    pub fn is_allowed(self) -> bool {
        self == Self::Allowed
    }

    /// Conjunction of individual decisions.
    ///
    /// Allowed iff every decision is allowed; an empty input is allowed.
    #[must_use]
    pub fn all<I>(decisions: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        if decisions.into_iter().all(Self::is_allowed) {
            Self::Allowed
        } else {
            Self::Denied
        }
    }
}

/// The `(relation, subject_id)` half of a relationship; the resource it is
/// scoped to travels next to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Relationship {
    /// Name of the relationship (e.g. "owner").
    pub relation: String,
    /// The "other end" of the relationship.
    pub subject_id: String,
}

impl Relationship {
    #[must_use]
    pub fn new(relation: impl Into<String>, subject_id: impl Into<String>) -> Self {
        Self {
            relation: relation.into(),
            subject_id: subject_id.into(),
        }
    }
}

/// A full `(resource_id, relation, subject_id)` tuple, the atomic unit of
/// authorization state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelationshipTuple {
    pub resource_id: String,
    pub relation: String,
    pub subject_id: String,
}

impl RelationshipTuple {
    #[must_use]
    pub fn new(
        resource_id: impl Into<String>,
        relation: impl Into<String>,
        subject_id: impl Into<String>,
    ) -> Self {
        Self {
            resource_id: resource_id.into(),
            relation: relation.into(),
            subject_id: subject_id.into(),
        }
    }

    #[must_use]
    pub fn relationship(&self) -> Relationship {
        Relationship::new(self.relation.clone(), self.subject_id.clone())
    }
}

impl fmt::Display for RelationshipTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}@{}", self.resource_id, self.relation, self.subject_id)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn conjunction_of_nothing_is_allowed() {
        assert_eq!(AccessDecision::all(Vec::new()), AccessDecision::Allowed);
    }

    #[test]
    fn conjunction_is_denied_by_any_single_denial() {
        let decisions = [
            AccessDecision::Allowed,
            AccessDecision::Denied,
            AccessDecision::Allowed,
        ];

        assert_eq!(AccessDecision::all(decisions), AccessDecision::Denied);
        assert_eq!(
            AccessDecision::all([AccessDecision::Allowed, AccessDecision::Allowed]),
            AccessDecision::Allowed
        );
    }

    #[test]
    fn subject_claims_are_structured() {
        let subject = Subject::new("hello")
            .with_claim("aud", "world")
            .with_claim("groups", json!(["a", "b"]));

        assert_eq!(subject.claim("aud"), Some(&json!("world")));
        assert_eq!(subject.claim("groups"), Some(&json!(["a", "b"])));
        assert!(subject.claim("missing").is_none());
    }

    #[test]
    fn tuple_display_and_relationship() {
        let tuple = RelationshipTuple::new("doc-42", "owner", "user-7");

        assert_eq!(tuple.to_string(), "doc-42#owner@user-7");
        assert_eq!(tuple.relationship(), Relationship::new("owner", "user-7"));
    }

    #[test]
    fn subject_deserializes_without_claims() {
        let subject: Subject = serde_json::from_value(json!({ "subject_id": "svc" })).unwrap();

        assert_eq!(subject.subject_id, "svc");
        assert!(subject.claims.is_empty());
    }
}
