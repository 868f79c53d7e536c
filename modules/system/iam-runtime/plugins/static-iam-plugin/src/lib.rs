#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Static IAM Runtime Plugin
//!
//! In-memory backend for the IAM runtime, for development and testing.
//!
//! - credentials map to subjects through a fixed token table
//! - relationships live in an in-memory store, seeded from configuration
//! - a policy lists which relations grant which actions
//! - access tokens are unsigned base64url JSON envelopes
//!
//! ## Configuration
//!
//! ```yaml
//! static_plugin:
//!   audience: world
//!   token_ttl: 15m
//!   tokens:
//!     - token: hello
//!       subject_id: hello
//!       claims:
//!         aud: world
//!   policy:
//!     - action: greet
//!       relations: [greeter]
//!     - action: manage
//!       relations: [owner]
//!   relationships:
//!     - resource_id: world
//!       relation: greeter
//!       subject_id: hello
//!     - resource_id: world
//!       relation: owner
//!       subject_id: hello
//! ```

use std::sync::Arc;

pub mod config;
pub mod domain;

pub use config::{MANAGE_ACTION, StaticIamPluginConfig};
pub use domain::{ConfigError, RelationshipStore, Service as StaticIamPlugin};

/// Build the plugin from configuration.
///
/// The returned service implements all three backend traits.
///
/// # Errors
///
/// Returns [`ConfigError`] if the configuration is inconsistent.
pub fn build(cfg: &StaticIamPluginConfig) -> Result<Arc<StaticIamPlugin>, ConfigError> {
    StaticIamPlugin::from_config(cfg).map(Arc::new)
}
