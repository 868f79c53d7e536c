//! IAM Runtime
//!
//! Sidecar that answers authentication, authorization and identity calls
//! over a unix-domain socket, delegating backend-defined decisions to a
//! plugin implementing the `iam_runtime_sdk` plugin traits.
//!
//! - [`domain::Service`] - Validation, conjunction and error classes
//! - [`domain::IamRuntimeLocalClient`] - In-process client for embedding
//! - [`grpc`] - `runtime.iam.v1` services honoring the [`iam_runtime_sdk::ProtocolStyle`]
//! - [`server::RuntimeServer`] - Socket ownership and graceful shutdown
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod domain;
pub mod grpc;
pub mod server;
pub mod socket;

pub use config::IamRuntimeConfig;
pub use domain::{DomainError, IamRuntimeLocalClient, Service};
pub use server::RuntimeServer;
pub use socket::{SocketError, SocketGuard};
