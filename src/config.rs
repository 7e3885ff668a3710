//! Compiler configuration.
//!
//! Loaded from YAML; every key is optional and falls back to its default.
//!
//! ```yaml
//! version: 1
//! bin:
//!   maxbins: 10
//! layout:
//!   wrap_columns: 4
//! limits:
//!   max_facets: 500
//!   max_layout_children: 1000
//!   max_mark_instances: 1000000
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Defaults for `bin` steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinConfig {
    /// Bucket budget for `bin` steps that give neither `step` nor `maxbins`.
    #[serde(default = "default_maxbins")]
    pub maxbins: usize,
}

fn default_maxbins() -> usize {
    10
}

impl Default for BinConfig {
    fn default() -> Self {
        Self {
            maxbins: default_maxbins(),
        }
    }
}

/// Layout policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Column count for `wrap` layouts that omit `columns`.
    ///
    /// There is no built-in default; without this, such layouts are rejected.
    #[serde(default)]
    pub wrap_columns: Option<usize>,
}

/// Host-imposed evaluation limits. `None` means unlimited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    /// Maximum distinct detail values a facet node may fan out into.
    #[serde(default)]
    pub max_facets: Option<usize>,
    /// Maximum children a single layout may arrange.
    #[serde(default)]
    pub max_layout_children: Option<usize>,
    /// Maximum mark instances a single terminal view may emit.
    #[serde(default)]
    pub max_mark_instances: Option<usize>,
}

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Configuration version.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Binning defaults.
    #[serde(default)]
    pub bin: BinConfig,

    /// Layout policy.
    #[serde(default)]
    pub layout: LayoutConfig,

    /// Evaluation limits.
    #[serde(default)]
    pub limits: Limits,
}

fn default_version() -> u32 {
    1
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            bin: BinConfig::default(),
            layout: LayoutConfig::default(),
            limits: Limits::default(),
        }
    }
}

impl CompilerConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .map_err(|_| Error::ConfigNotFound(path.display().to_string()))?;

        Self::parse(&content)
    }

    /// Parses configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error with line number if parsing fails.
    pub fn parse(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml).map_err(|e| {
            let line = e.location().map_or(0, |l| l.line());
            Error::ConfigParse {
                line,
                message: e.to_string(),
            }
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration with fallback to defaults.
    #[must_use]
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path.as_ref()) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(%err, "falling back to default compiler configuration");
                Self::default()
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.bin.maxbins == 0 {
            return Err(Error::ConfigParse {
                line: 0,
                message: "bin.maxbins must be at least 1".into(),
            });
        }
        if self.layout.wrap_columns == Some(0) {
            return Err(Error::ConfigParse {
                line: 0,
                message: "layout.wrap_columns must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Set the fallback wrap column count.
    #[must_use]
    pub fn with_wrap_columns(mut self, columns: usize) -> Self {
        self.layout.wrap_columns = Some(columns);
        self
    }

    /// Set evaluation limits.
    #[must_use]
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_config_default() {
        let config = CompilerConfig::new();

        assert_eq!(config.version, 1);
        assert_eq!(config.bin.maxbins, 10);
        assert_eq!(config.layout.wrap_columns, None);
        assert_eq!(config.limits, Limits::default());
    }

    #[test]
    fn test_config_parse_minimal() {
        let config = CompilerConfig::parse("version: 1").unwrap();
        assert_eq!(config, CompilerConfig::default());
    }

    #[test]
    fn test_config_parse_full() {
        let yaml = r"
version: 1
bin:
  maxbins: 20
layout:
  wrap_columns: 4
limits:
  max_facets: 50
  max_mark_instances: 1000
";

        let config = CompilerConfig::parse(yaml).unwrap();

        assert_eq!(config.bin.maxbins, 20);
        assert_eq!(config.layout.wrap_columns, Some(4));
        assert_eq!(config.limits.max_facets, Some(50));
        assert_eq!(config.limits.max_layout_children, None);
        assert_eq!(config.limits.max_mark_instances, Some(1000));
    }

    #[test]
    fn test_config_parse_error_includes_line() {
        let yaml = r"
version: 1
bin:
  maxbins: lots
";

        let err = CompilerConfig::parse(yaml).unwrap_err();
        let display = err.to_string();
        assert!(display.contains('4'), "Error should include line number: {display}");
    }

    #[test]
    fn test_config_rejects_zero_columns() {
        let yaml = "layout:\n  wrap_columns: 0\n";
        assert!(CompilerConfig::parse(yaml).is_err());
    }

    #[test]
    fn test_config_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "layout:\n  wrap_columns: 3").unwrap();

        let config = CompilerConfig::load(file.path()).unwrap();
        assert_eq!(config.layout.wrap_columns, Some(3));
    }

    #[test]
    fn test_config_load_missing() {
        let err = CompilerConfig::load("/nonexistent/trueno-grammar.yaml").unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound(_)));
        let config = CompilerConfig::load_or_default("/nonexistent/trueno-grammar.yaml");
        assert_eq!(config, CompilerConfig::default());
    }
}
