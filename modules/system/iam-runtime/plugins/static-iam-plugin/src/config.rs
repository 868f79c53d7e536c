//! Configuration for the static IAM plugin.

use std::collections::HashMap;
use std::time::Duration;

use iam_runtime_sdk::RelationshipTuple;
use serde::{Deserialize, Serialize};

/// Action that guards changes to a resource's relationships.
pub const MANAGE_ACTION: &str = "manage";

/// Plugin configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StaticIamPluginConfig {
    /// Audience written into minted access tokens.
    pub audience: String,

    /// Lifetime of minted access tokens (e.g. `"15m"`).
    #[serde(with = "humantime_duration")]
    pub token_ttl: Duration,

    /// Static credential-to-subject mappings.
    pub tokens: Vec<TokenMapping>,

    /// Which relations permit which actions.
    pub policy: Vec<PolicyRule>,

    /// Relationships loaded into the store at startup.
    pub relationships: Vec<RelationshipTuple>,
}

impl Default for StaticIamPluginConfig {
    fn default() -> Self {
        Self {
            audience: "world".to_owned(),
            token_ttl: Duration::from_secs(15 * 60),
            tokens: vec![TokenMapping {
                token: "hello".to_owned(),
                subject_id: "hello".to_owned(),
                claims: HashMap::from([("aud".to_owned(), serde_json::json!("world"))]),
            }],
            policy: vec![
                PolicyRule {
                    action: "greet".to_owned(),
                    relations: vec!["greeter".to_owned()],
                },
                PolicyRule {
                    action: MANAGE_ACTION.to_owned(),
                    relations: vec!["owner".to_owned()],
                },
            ],
            relationships: vec![
                RelationshipTuple::new("world", "greeter", "hello"),
                RelationshipTuple::new("world", "owner", "hello"),
                RelationshipTuple::new("mars", "owner", "hello"),
            ],
        }
    }
}

/// Maps a static credential to a subject.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TokenMapping {
    /// The credential value to match, byte for byte.
    pub token: String,
    pub subject_id: String,
    #[serde(default)]
    pub claims: HashMap<String, serde_json::Value>,
}

/// Grants `action` to any subject holding one of `relations` on the resource.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyRule {
    pub action: String,
    pub relations: Vec<String>,
}

mod humantime_duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&humantime::format_duration(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}
