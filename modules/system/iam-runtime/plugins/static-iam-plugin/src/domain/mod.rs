//! Domain layer for the static IAM plugin.

mod client;
pub mod service;
pub mod store;

pub use service::{ConfigError, Service};
pub use store::RelationshipStore;
