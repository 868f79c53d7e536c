//! Protocol style: how denial and invalidity travel on the wire.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Wire signalling style, chosen once per deployment.
///
/// The runtime applies the configured style to all three services. Clients
/// accept both and normalize them to the same [`crate::IamRuntimeError`]s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolStyle {
    /// Invalid credentials and denials are `UNAUTHENTICATED` /
    /// `PERMISSION_DENIED` statuses; success payloads carry no negative result.
    #[default]
    ErrorSignal,
    /// Invalid credentials and denials are `RESULT_INVALID` / `RESULT_DENIED`
    /// response fields.
    FieldSignal,
}

impl ProtocolStyle {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ErrorSignal => "error_signal",
            Self::FieldSignal => "field_signal",
        }
    }
}

impl fmt::Display for ProtocolStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown protocol style.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown protocol style '{0}', expected 'error_signal' or 'field_signal'")]
pub struct ParseProtocolStyleError(String);

impl FromStr for ProtocolStyle {
    type Err = ParseProtocolStyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "error_signal" => Ok(Self::ErrorSignal),
            "field_signal" => Ok(Self::FieldSignal),
            _ => Err(ParseProtocolStyleError(s.to_owned())),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn default_is_error_signal() {
        assert_eq!(ProtocolStyle::default(), ProtocolStyle::ErrorSignal);
    }

    #[test]
    fn parses_cli_and_config_spellings() {
        assert_eq!(
            "field-signal".parse::<ProtocolStyle>().unwrap(),
            ProtocolStyle::FieldSignal
        );
        assert_eq!(
            "ERROR_SIGNAL".parse::<ProtocolStyle>().unwrap(),
            ProtocolStyle::ErrorSignal
        );
        assert!("both".parse::<ProtocolStyle>().is_err());
    }

    #[test]
    fn serde_uses_snake_case() {
        let style: ProtocolStyle = serde_json::from_str("\"field_signal\"").unwrap();

        assert_eq!(style, ProtocolStyle::FieldSignal);
        assert_eq!(style.to_string(), "field_signal");
    }
}
