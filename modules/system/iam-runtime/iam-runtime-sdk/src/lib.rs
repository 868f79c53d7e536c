#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! IAM Runtime SDK
//!
//! This crate provides the public contracts of the IAM runtime sidecar:
//!
//! - [`AuthNRuntimeClient`], [`AuthZRuntimeClient`], [`IdentityRuntimeClient`] - Public API traits
//! - [`IamRuntime`] - Aggregate of the three contracts, built once at application startup
//! - [`AuthNPluginClient`], [`AuthZPluginClient`], [`IdentityPluginClient`] - Backend traits
//! - [`Subject`], [`AccessRequestAction`], [`Relationship`], [`AccessDecision`] - Relationship model
//! - [`Credential`], [`AccessToken`] - Secret-bearing values
//! - [`IamRuntimeError`], [`ErrorClass`] - Error taxonomy
//! - [`ProtocolStyle`] - How denial and invalidity travel on the wire
//! - `grpc` (feature) - Protobuf contract and a unix-domain-socket client
//!
//! ## Usage
//!
//! ```ignore
//! use iam_runtime_sdk::{AccessRequestAction, Credential, IamRuntime};
//!
//! let credential = Credential::new("hello");
//! let subject = runtime.validate_credential(&credential).await?;
//!
//! // Allowed only if every action is allowed
//! runtime
//!     .check_access(&credential, &[AccessRequestAction::new("greet", "world")])
//!     .await?;
//! ```

pub mod api;
pub mod credential;
pub mod error;
pub mod models;
pub mod plugin_api;
pub mod style;

#[cfg(feature = "grpc")]
pub mod grpc;

// Re-export main types at crate root
pub use api::{AuthNRuntimeClient, AuthZRuntimeClient, IamRuntime, IdentityRuntimeClient};
pub use credential::{AccessToken, Credential};
pub use error::{ErrorClass, IamRuntimeError};
pub use models::{
    AccessDecision, AccessRequestAction, CredentialValidation, Relationship, RelationshipTuple,
    Subject,
};
pub use plugin_api::{AuthNPluginClient, AuthZPluginClient, IdentityPluginClient};
pub use style::{ParseProtocolStyleError, ProtocolStyle};
