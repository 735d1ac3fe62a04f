//! Engine configuration.
//!
//! Defaults suit the bundled `content/` directory. A YAML file may override
//! the defaults, and environment variables override both:
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `OCF_CONTENT_DIR` | `content-dir` | `content` |
//! | `OCF_SCHEMA_VERSION` | `schema-version` | `1.1.2` |
//! | `OCF_STRICT` | `strict-mode` | `false` |
//! | `OCF_MERGE_STRATEGY` | `default-merge-strategy` | `error-on-conflict` |
//! | `OCF_BATCH_TIMEOUT_SECS` | `batch-timeout-secs` | `30` |
//! | `OCF_BATCH_CONCURRENCY` | `batch-concurrency` | `4` |

use std::path::{Path, PathBuf};

use ocf_catalog::{MergeStrategy, ResolveOptions};
use ocf_schema::DEFAULT_SCHEMA_VERSION;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct EngineConfig {
    /// Directory holding `catalogs/`, `profiles/` and `registry.yaml`.
    pub content_dir: PathBuf,
    pub schema_version: String,
    /// Report unknown top-level SSP sections as structural errors.
    pub strict_mode: bool,
    /// Strategy for colliding imports before a profile declares one.
    pub default_merge_strategy: MergeStrategy,
    pub batch_timeout_secs: u64,
    pub batch_concurrency: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from("content"),
            schema_version: DEFAULT_SCHEMA_VERSION.to_string(),
            strict_mode: false,
            default_merge_strategy: MergeStrategy::default(),
            batch_timeout_secs: 30,
            batch_concurrency: 4,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by the `OCF_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_overrides(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    /// Values from a YAML file, then the `OCF_*` environment variables.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_file(path)?;
        config.apply_overrides(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    /// Values from a YAML file only.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from any variable source. `lookup` returns the value
    /// of a variable, or `None` when it is unset.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("OCF_CONTENT_DIR") {
            self.content_dir = PathBuf::from(dir);
        }
        if let Some(version) = lookup("OCF_SCHEMA_VERSION") {
            self.schema_version = version.trim().to_string();
        }
        if let Some(raw) = lookup("OCF_STRICT") {
            self.strict_mode = parse_bool("OCF_STRICT", &raw)?;
        }
        if let Some(raw) = lookup("OCF_MERGE_STRATEGY") {
            self.default_merge_strategy = raw
                .parse()
                .map_err(|_| ConfigError::invalid("OCF_MERGE_STRATEGY", &raw, "expected keep-first, keep-last or error-on-conflict"))?;
        }
        if let Some(raw) = lookup("OCF_BATCH_TIMEOUT_SECS") {
            self.batch_timeout_secs = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid("OCF_BATCH_TIMEOUT_SECS", &raw, "expected a whole number of seconds"))?;
        }
        if let Some(raw) = lookup("OCF_BATCH_CONCURRENCY") {
            self.batch_concurrency = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid("OCF_BATCH_CONCURRENCY", &raw, "expected a positive integer"))?;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_concurrency == 0 {
            return Err(ConfigError::invalid("batch-concurrency", "0", "must be at least 1"));
        }
        if self.batch_timeout_secs == 0 {
            return Err(ConfigError::invalid("batch-timeout-secs", "0", "must be at least 1"));
        }
        if self.schema_version.is_empty() {
            return Err(ConfigError::invalid("schema-version", "", "must not be empty"));
        }
        Ok(())
    }

    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            default_merge_strategy: self.default_merge_strategy,
        }
    }
}

fn parse_bool(var: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::invalid(var, raw, "expected true or false")),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("invalid value {value:?} for {field}: {reason}")]
    Invalid {
        field: String,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(field: &str, value: &str, reason: &str) -> Self {
        Self::Invalid {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}
