//! Domain layer for the IAM runtime.

pub mod error;
pub mod local_client;
pub mod service;

pub use error::DomainError;
pub use local_client::IamRuntimeLocalClient;
pub use service::Service;
