//! Service implementation for the static IAM plugin.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use iam_runtime_sdk::{
    AccessDecision, AccessRequestAction, CredentialValidation, Relationship, Subject,
};
use serde::Serialize;
use uuid::Uuid;

use super::store::RelationshipStore;
use crate::config::{StaticIamPluginConfig, TokenMapping};

/// Invalid plugin configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("tokens[{0}]: token must not be empty")]
    EmptyToken(usize),

    #[error("tokens[{0}]: subject_id must not be empty")]
    EmptySubject(usize),

    #[error("tokens[{0}]: duplicate token")]
    DuplicateToken(usize),

    #[error("policy[{0}]: action and relations must not be empty")]
    EmptyPolicy(usize),

    #[error("relationships[{0}]: resource_id, relation and subject_id must not be empty")]
    EmptyRelationship(usize),

    #[error("token_ttl must be greater than zero")]
    ZeroTokenTtl,
}

/// Static IAM service.
///
/// - credentials are looked up in a fixed table
/// - an action on a resource is allowed when the subject holds one of the
///   relations the policy lists for that action
/// - access tokens are unsigned base64url JSON envelopes
pub struct Service {
    tokens: HashMap<String, TokenMapping>,
    policy: HashMap<String, HashSet<String>>,
    store: RelationshipStore,
    audience: String,
    token_ttl: Duration,
}

#[derive(Serialize)]
struct TokenEnvelope<'a> {
    sub: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
    jti: String,
}

impl Service {
    /// Create a service from plugin configuration and seed the store.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for empty identifiers, duplicate tokens or a
    /// zero token lifetime.
    pub fn from_config(cfg: &StaticIamPluginConfig) -> Result<Self, ConfigError> {
        if cfg.token_ttl.is_zero() {
            return Err(ConfigError::ZeroTokenTtl);
        }

        let mut tokens = HashMap::with_capacity(cfg.tokens.len());
        for (i, mapping) in cfg.tokens.iter().enumerate() {
            if mapping.token.is_empty() {
                return Err(ConfigError::EmptyToken(i));
            }
            if mapping.subject_id.is_empty() {
                return Err(ConfigError::EmptySubject(i));
            }
            if tokens
                .insert(mapping.token.clone(), mapping.clone())
                .is_some()
            {
                return Err(ConfigError::DuplicateToken(i));
            }
        }

        let mut policy: HashMap<String, HashSet<String>> = HashMap::new();
        for (i, rule) in cfg.policy.iter().enumerate() {
            if rule.action.is_empty()
                || rule.relations.is_empty()
                || rule.relations.iter().any(String::is_empty)
            {
                return Err(ConfigError::EmptyPolicy(i));
            }
            policy
                .entry(rule.action.clone())
                .or_default()
                .extend(rule.relations.iter().cloned());
        }

        let store = RelationshipStore::new();
        for (i, seed) in cfg.relationships.iter().enumerate() {
            if seed.resource_id.is_empty() || seed.relation.is_empty() || seed.subject_id.is_empty()
            {
                return Err(ConfigError::EmptyRelationship(i));
            }
            store.insert(&seed.resource_id, &[seed.relationship()]);
        }

        tracing::debug!(
            tokens = tokens.len(),
            actions = policy.len(),
            relationships = store.len(),
            "Static IAM plugin configured"
        );

        Ok(Self {
            tokens,
            policy,
            store,
            audience: cfg.audience.clone(),
            token_ttl: cfg.token_ttl,
        })
    }

    /// Look up a credential in the static table.
    #[must_use]
    pub fn validate(&self, credential: &str) -> CredentialValidation {
        match self.tokens.get(credential) {
            Some(mapping) => CredentialValidation::Valid(Subject {
                subject_id: mapping.subject_id.clone(),
                claims: mapping.claims.clone(),
            }),
            None => CredentialValidation::Invalid,
        }
    }

    /// Decide each action for `subject`, in input order.
    ///
    /// All resources named by `actions` are read at one point in time, so
    /// the decisions never combine states the store did not hold together.
    #[must_use]
    pub fn evaluate(&self, subject: &Subject, actions: &[AccessRequestAction]) -> Vec<AccessDecision> {
        let snapshots = self
            .store
            .snapshot_many(actions.iter().map(|a| a.resource_id.as_str()));

        actions
            .iter()
            .map(|request| {
                let Some(relations) = self.policy.get(&request.action) else {
                    return AccessDecision::Denied;
                };
                let allowed = snapshots.get(&request.resource_id).is_some_and(|held| {
                    held.iter().any(|r| {
                        r.subject_id == subject.subject_id && relations.contains(&r.relation)
                    })
                });
                if allowed {
                    AccessDecision::Allowed
                } else {
                    AccessDecision::Denied
                }
            })
            .collect()
    }

    pub fn create_relationships(&self, resource_id: &str, relationships: &[Relationship]) {
        let inserted = self.store.insert(resource_id, relationships);
        tracing::debug!(resource_id, requested = relationships.len(), inserted, "Relationships created");
    }

    pub fn delete_relationships(&self, resource_id: &str, relationships: &[Relationship]) {
        let removed = self.store.remove(resource_id, relationships);
        tracing::debug!(resource_id, requested = relationships.len(), removed, "Relationships deleted");
    }

    /// Mint a fresh access token for `subject`.
    ///
    /// # Errors
    ///
    /// Fails only if the envelope cannot be serialized.
    pub fn mint(&self, subject: &Subject) -> Result<String, serde_json::Error> {
        let iat = Utc::now().timestamp();
        let ttl = i64::try_from(self.token_ttl.as_secs()).unwrap_or(i64::MAX);

        let envelope = TokenEnvelope {
            sub: &subject.subject_id,
            aud: &self.audience,
            iat,
            exp: iat.saturating_add(ttl),
            jti: Uuid::new_v4().to_string(),
        };

        let json = serde_json::to_vec(&envelope)?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    #[must_use]
    pub fn store(&self) -> &RelationshipStore {
        &self.store
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::config::PolicyRule;
    use iam_runtime_sdk::RelationshipTuple;

    fn service() -> Service {
        Service::from_config(&StaticIamPluginConfig::default()).unwrap()
    }

    fn docs_config() -> StaticIamPluginConfig {
        StaticIamPluginConfig {
            policy: vec![
                PolicyRule {
                    action: "read".to_owned(),
                    relations: vec!["viewer".to_owned(), "editor".to_owned()],
                },
                PolicyRule {
                    action: "write".to_owned(),
                    relations: vec!["editor".to_owned()],
                },
            ],
            relationships: vec![RelationshipTuple::new("doc1", "viewer", "bob")],
            ..StaticIamPluginConfig::default()
        }
    }

    #[test]
    fn known_credential_resolves_to_subject_with_claims() {
        let CredentialValidation::Valid(subject) = service().validate("hello") else {
            panic!("expected a valid credential");
        };

        assert_eq!(subject.subject_id, "hello");
        assert_eq!(subject.claim("aud"), Some(&serde_json::json!("world")));
    }

    #[test]
    fn unknown_credential_is_invalid() {
        assert_eq!(service().validate("nope"), CredentialValidation::Invalid);
        assert_eq!(service().validate("Hello"), CredentialValidation::Invalid);
    }

    #[test]
    fn hello_may_greet_world_only() {
        let decisions = service().evaluate(
            &Subject::new("hello"),
            &[
                AccessRequestAction::new("greet", "world"),
                AccessRequestAction::new("greet", "mars"),
                AccessRequestAction::new("wave", "world"),
            ],
        );

        assert_eq!(
            decisions,
            vec![AccessDecision::Allowed, AccessDecision::Denied, AccessDecision::Denied]
        );
    }

    #[test]
    fn relations_grant_actions_through_policy() {
        let svc = Service::from_config(&docs_config()).unwrap();
        let bob = Subject::new("bob");

        let before = svc.evaluate(
            &bob,
            &[AccessRequestAction::new("read", "doc1"), AccessRequestAction::new("write", "doc1")],
        );
        assert_eq!(before, vec![AccessDecision::Allowed, AccessDecision::Denied]);

        svc.create_relationships("doc1", &[Relationship::new("editor", "bob")]);
        let after = svc.evaluate(&bob, &[AccessRequestAction::new("write", "doc1")]);
        assert_eq!(after, vec![AccessDecision::Allowed]);

        svc.delete_relationships("doc1", &[Relationship::new("editor", "bob")]);
        let reverted = svc.evaluate(&bob, &[AccessRequestAction::new("write", "doc1")]);
        assert_eq!(reverted, vec![AccessDecision::Denied]);
    }

    #[test]
    fn relationships_of_other_subjects_do_not_leak() {
        let svc = Service::from_config(&docs_config()).unwrap();

        let decisions = svc.evaluate(&Subject::new("carol"), &[AccessRequestAction::new("read", "doc1")]);

        assert_eq!(decisions, vec![AccessDecision::Denied]);
    }

    #[test]
    fn minted_token_is_a_base64url_json_envelope() {
        let svc = service();

        let token = svc.mint(&Subject::new("hello")).unwrap();
        let decoded: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(&token).unwrap()).unwrap();

        assert_eq!(decoded["sub"], "hello");
        assert_eq!(decoded["aud"], "world");
        assert_eq!(
            decoded["exp"].as_i64().unwrap() - decoded["iat"].as_i64().unwrap(),
            15 * 60
        );
        assert_ne!(svc.mint(&Subject::new("hello")).unwrap(), token);
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let mut cfg = StaticIamPluginConfig::default();
        cfg.tokens.push(cfg.tokens[0].clone());
        assert_eq!(
            Service::from_config(&cfg).err(),
            Some(ConfigError::DuplicateToken(1))
        );

        let mut cfg = StaticIamPluginConfig::default();
        cfg.relationships[0].relation.clear();
        assert_eq!(
            Service::from_config(&cfg).err(),
            Some(ConfigError::EmptyRelationship(0))
        );

        let cfg = StaticIamPluginConfig {
            token_ttl: Duration::ZERO,
            ..StaticIamPluginConfig::default()
        };
        assert_eq!(Service::from_config(&cfg).err(), Some(ConfigError::ZeroTokenTtl));

        let mut cfg = StaticIamPluginConfig::default();
        cfg.policy[0].relations.clear();
        assert_eq!(Service::from_config(&cfg).err(), Some(ConfigError::EmptyPolicy(0)));
    }

    #[test]
    fn multi_resource_check_never_allows_a_state_that_did_not_exist() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicBool, Ordering};

        let svc = Arc::new(Service::from_config(&StaticIamPluginConfig::default()).unwrap());
        let stop = Arc::new(AtomicBool::new(false));
        let grant = [Relationship::new("greeter", "hello")];

        // "a" and "b" are never granted at the same time.
        let writer = {
            let svc = Arc::clone(&svc);
            let stop = Arc::clone(&stop);
            std::thread::spawn(move || {
                while !stop.load(Ordering::Relaxed) {
                    svc.create_relationships("a", &grant);
                    svc.delete_relationships("a", &grant);
                    svc.create_relationships("b", &grant);
                    svc.delete_relationships("b", &grant);
                }
            })
        };

        let hello = Subject::new("hello");
        let both = [AccessRequestAction::new("greet", "a"), AccessRequestAction::new("greet", "b")];
        for _ in 0..20_000 {
            let decisions = svc.evaluate(&hello, &both);
            assert_eq!(
                AccessDecision::all(decisions),
                AccessDecision::Denied,
                "a and b allowed together"
            );
        }

        stop.store(true, Ordering::Relaxed);
        writer.join().unwrap();
    }
}
