//! # ocf-cli: Command-Line Interface for the Compliance Engine
//!
//! Provides the `ocf` binary. Handlers parse arguments, call into
//! `ocf-compliance` and friends, and format results. No rule logic
//! lives here.
//!
//! ## Subcommands
//!
//! - `ocf resolve`: Resolve a baseline and print its controls.
//! - `ocf validate`: Validate one document against a baseline.
//! - `ocf convert`: Convert between JSON, YAML and XML with digest checks.
//! - `ocf batch`: Validate many documents concurrently.
//! - `ocf digest`: Print the semantic digest of a document.
//!
//! ```bash
//! ocf validate ssp.yaml --baseline moderate
//! ocf convert ssp.json --to xml -o ssp.xml
//! ocf batch plans/*.json --baseline high --format json
//! ```
//!
//! ## Exit Codes
//!
//! `0` pass, `1` failed validation or operational error, `2` structurally
//! invalid document.

pub mod batch;
pub mod convert;
pub mod digest;
pub mod resolve;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use ocf_compliance::{EngineConfig, RunOutcome};
use ocf_convert::Encoding;
use serde::Serialize;

/// How command results are written to stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

/// Engine configuration from `--config` (if given) overlaid with `OCF_*`
/// environment variables.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display())),
        None => EngineConfig::from_env().context("invalid OCF_* environment configuration"),
    }
}

/// Read a document and settle its encoding: the explicit one if given,
/// otherwise the one implied by the file extension.
pub fn read_document(path: &Path, encoding: Option<Encoding>) -> Result<(Vec<u8>, Encoding)> {
    let encoding = match encoding {
        Some(encoding) => encoding,
        None => Encoding::from_path(path)
            .with_context(|| format!("cannot infer encoding of {}; pass --encoding", path.display()))?,
    };
    let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok((bytes, encoding))
}

/// Serialize `value` to stdout in a machine-readable format.
pub fn emit<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json | OutputFormat::Text => {
            println!("{}", serde_json::to_string_pretty(value).context("failed to serialize output")?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yaml::to_string(value).context("failed to serialize output")?);
        }
    }
    Ok(())
}

pub fn exit_code(outcome: RunOutcome) -> u8 {
    match outcome {
        RunOutcome::Pass => 0,
        RunOutcome::Fail => 1,
        RunOutcome::Invalid => 2,
    }
}

/// Display name for a path given on the command line.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
