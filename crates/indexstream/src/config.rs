//! Module: config
//! Responsibility: tunables for cursor decoding and page cost limits.
//! Does not own: per-request overrides, which live on `PageRequest`.
//! Boundary: loaded once by embedders and passed to the paginator.

use crate::MAX_CURSOR_LEN;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

///
/// StreamConfig
///
/// Every field is optional in TOML; missing fields take their defaults.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StreamConfig {
    /// Longest cursor text accepted from callers.
    pub max_cursor_len: usize,

    /// Hard cap on rows read per page when a request does not carry its own.
    pub maximum_rows_read: Option<usize>,

    /// Rows read beyond the requested item count before a split is recommended.
    pub split_recommended_slack: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            max_cursor_len: MAX_CURSOR_LEN,
            maximum_rows_read: None,
            split_recommended_slack: 1,
        }
    }
}

impl StreamConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;

        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_cursor_len == 0 {
            return Err(ConfigError::Invalid(
                "max_cursor_len must be greater than zero".to_string(),
            ));
        }
        if self.maximum_rows_read == Some(0) {
            return Err(ConfigError::Invalid(
                "maximum_rows_read must be greater than zero when set".to_string(),
            ));
        }

        Ok(())
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::{ConfigError, StreamConfig};
    use crate::MAX_CURSOR_LEN;

    #[test]
    fn empty_document_yields_defaults() {
        let config = StreamConfig::from_toml_str("").expect("empty config should parse");

        assert_eq!(config, StreamConfig::default());
        assert_eq!(config.max_cursor_len, MAX_CURSOR_LEN);
        assert_eq!(config.split_recommended_slack, 1);
    }

    #[test]
    fn fields_override_defaults() {
        let config = StreamConfig::from_toml_str(
            "maximum_rows_read = 500\nsplit_recommended_slack = 10\n",
        )
        .expect("config should parse");

        assert_eq!(config.maximum_rows_read, Some(500));
        assert_eq!(config.split_recommended_slack, 10);
        assert_eq!(config.max_cursor_len, MAX_CURSOR_LEN);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = StreamConfig::from_toml_str("max_rows = 3\n")
            .expect_err("unknown field should be rejected");

        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn zero_limits_are_invalid() {
        let err = StreamConfig::from_toml_str("maximum_rows_read = 0\n")
            .expect_err("zero row cap should be rejected");
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = StreamConfig::from_toml_str("max_cursor_len = 0\n")
            .expect_err("zero cursor length should be rejected");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = StreamConfig::from_file("/nonexistent/indexstream.toml")
            .expect_err("missing file should fail");

        assert!(err.to_string().contains("/nonexistent/indexstream.toml"));
    }
}
