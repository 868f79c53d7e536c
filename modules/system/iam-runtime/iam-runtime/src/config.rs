//! Configuration for the IAM runtime.

use std::path::PathBuf;

use iam_runtime_sdk::ProtocolStyle;
use serde::{Deserialize, Serialize};

/// Default socket the runtime listens on.
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/runtime.sock";

/// Configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct IamRuntimeConfig {
    /// Unix-domain socket to serve on.
    pub socket_path: PathBuf,

    /// How denials and invalid credentials are reported to clients.
    pub protocol_style: ProtocolStyle,
}

impl Default for IamRuntimeConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            protocol_style: ProtocolStyle::default(),
        }
    }
}
