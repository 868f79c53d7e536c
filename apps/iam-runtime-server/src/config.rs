//! Layered configuration: defaults, YAML file, environment, CLI flags.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use iam_runtime::IamRuntimeConfig;
use iam_runtime_sdk::ProtocolStyle;
use serde::{Deserialize, Serialize};
use static_iam_plugin::StaticIamPluginConfig;

use crate::logging::LoggingConfig;

/// Prefix of environment overrides; `__` separates nested keys, e.g.
/// `IAM_RUNTIME__RUNTIME__SOCKET_PATH`.
pub const ENV_PREFIX: &str = "IAM_RUNTIME__";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub runtime: IamRuntimeConfig,
    pub static_plugin: StaticIamPluginConfig,
}

/// Values given on the command line; they win over every other layer.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub socket_path: Option<PathBuf>,
    pub protocol_style: Option<ProtocolStyle>,
    pub log_level: Option<String>,
}

impl AppConfig {
    /// Build the layered provider without extracting it.
    #[must_use]
    pub fn figment(file: Option<&Path>, overrides: &Overrides) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(file) = file {
            figment = figment.merge(Yaml::file_exact(file));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        if let Some(path) = &overrides.socket_path {
            figment = figment.merge(Serialized::default("runtime.socket_path", path));
        }
        if let Some(style) = overrides.protocol_style {
            figment = figment.merge(Serialized::default("runtime.protocol_style", style));
        }
        if let Some(level) = &overrides.log_level {
            figment = figment.merge(Serialized::default("logging.level", level));
        }
        figment
    }

    /// Load and validate the configuration.
    ///
    /// # Errors
    ///
    /// Unreadable or malformed sources, unknown keys, invalid values.
    pub fn load(file: Option<&Path>, overrides: &Overrides) -> anyhow::Result<Self> {
        let config: Self = Self::figment(file, overrides).extract()?;
        Ok(config)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::time::Duration;

    use super::*;

    fn from_yaml(yaml: &str, overrides: &Overrides) -> Result<AppConfig, figment::Error> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runtime.yaml");
        std::fs::write(&path, yaml).unwrap();
        AppConfig::figment(Some(&path), overrides).extract()
    }

    #[test]
    fn defaults_serve_hello_world_on_tmp_socket() {
        let config = AppConfig::load(None, &Overrides::default()).unwrap();

        assert_eq!(config.runtime.socket_path, PathBuf::from("/tmp/runtime.sock"));
        assert_eq!(config.runtime.protocol_style, ProtocolStyle::ErrorSignal);
        assert_eq!(config.static_plugin.tokens[0].token, "hello");
    }

    #[test]
    fn yaml_file_overrides_defaults() {
        let config = from_yaml(
            r"
runtime:
  socket_path: /run/iam/runtime.sock
  protocol_style: field_signal
static_plugin:
  token_ttl: 1h
logging:
  format: json
",
            &Overrides::default(),
        )
        .unwrap();

        assert_eq!(config.runtime.socket_path, PathBuf::from("/run/iam/runtime.sock"));
        assert_eq!(config.runtime.protocol_style, ProtocolStyle::FieldSignal);
        assert_eq!(config.static_plugin.token_ttl, Duration::from_secs(3600));
        assert_eq!(config.logging.format, crate::logging::LogFormat::Json);
        assert_eq!(config.static_plugin.audience, "world");
    }

    #[test]
    fn cli_flags_win_over_the_file() {
        let overrides = Overrides {
            socket_path: Some(PathBuf::from("/tmp/cli.sock")),
            protocol_style: Some(ProtocolStyle::ErrorSignal),
            log_level: Some("debug".to_owned()),
        };

        let config = from_yaml(
            "runtime:\n  socket_path: /tmp/file.sock\n  protocol_style: field_signal\n",
            &overrides,
        )
        .unwrap();

        assert_eq!(config.runtime.socket_path, PathBuf::from("/tmp/cli.sock"));
        assert_eq!(config.runtime.protocol_style, ProtocolStyle::ErrorSignal);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = from_yaml("runtime:\n  port: 8080\n", &Overrides::default());

        assert!(result.is_err());
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let result = AppConfig::load(
            Some(Path::new("/nonexistent/iam-runtime.yaml")),
            &Overrides::default(),
        );

        assert!(result.is_err());
    }
}
