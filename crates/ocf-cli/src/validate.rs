//! # Validate Subcommand
//!
//! Validates one document against a baseline and prints the run.
//!
//! ```bash
//! ocf validate ssp.json --baseline moderate
//! ocf validate ssp.xml --baseline moderate@1.0 --strict --format json
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use ocf_compliance::{Engine, ValidationRun};
use ocf_convert::Encoding;

use crate::{exit_code, load_config, read_document, OutputFormat};

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Document to validate.
    pub path: PathBuf,

    /// Baseline as `name@version`, or a profile name that is unique.
    #[arg(long, short)]
    pub baseline: String,

    /// Document encoding. Inferred from the file extension when omitted.
    #[arg(long)]
    pub encoding: Option<Encoding>,

    /// Also report top-level sections the document model does not define.
    #[arg(long)]
    pub strict: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Execute the validate subcommand.
pub fn run_validate(args: &ValidateArgs, config_path: Option<&Path>) -> Result<u8> {
    let mut config = load_config(config_path)?;
    config.strict_mode |= args.strict;
    let engine = Engine::new(config).context("failed to initialize validation engine")?;

    let (bytes, encoding) = read_document(&args.path, args.encoding)?;
    let run = engine
        .validate(&bytes, encoding, &args.baseline)
        .with_context(|| format!("validation of {} aborted", args.path.display()))?;

    match args.format {
        OutputFormat::Text => print!("{}", render_run(&args.path.display().to_string(), &run)),
        format => crate::emit(&run, format)?,
    }
    Ok(exit_code(run.outcome))
}

/// Human-readable report for one run.
pub fn render_run(name: &str, run: &ValidationRun) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{name}: {} against {} ({} errors, {} advisories, {} ms)\n",
        run.outcome.as_str().to_uppercase(),
        run.baseline_id
            .as_ref()
            .map(|id| id.to_string())
            .unwrap_or_else(|| run.baseline.clone()),
        run.errors.len(),
        run.advisories.len(),
        run.duration_ms,
    ));
    for error in &run.errors {
        out.push_str(&format!("  {error}\n"));
    }
    for advisory in &run.advisories {
        out.push_str(&format!("  [advisory] {} at {}: {}\n", advisory.code, advisory.path, advisory.message));
    }
    out
}
