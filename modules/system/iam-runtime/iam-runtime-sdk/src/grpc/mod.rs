//! gRPC transport for the IAM runtime.
//!
//! - [`proto`] - Types and service stubs generated from `proto/runtime/iam/v1`
//! - [`IamRuntimeGrpcClient`] - Client for all three services over a unix-domain socket
//! - [`status`] - Mapping between [`crate::IamRuntimeError`] and `tonic::Status`

pub mod client;
pub mod convert;
pub mod status;

/// Generated protobuf types for `runtime.iam.v1`.
#[allow(
    clippy::all,
    clippy::pedantic,
    non_camel_case_types,
    unused_imports,
    missing_docs
)]
pub mod proto {
    tonic::include_proto!("runtime.iam.v1");
}

pub use client::{GrpcClientOptions, IamRuntimeGrpcClient, lazy_channel, socket_path};
