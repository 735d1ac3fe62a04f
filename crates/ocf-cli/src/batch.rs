//! # Batch Subcommand
//!
//! Validates many documents against one baseline on a bounded worker pool.
//!
//! ```bash
//! ocf batch plans/*.json --baseline moderate --concurrency 8 --timeout-secs 10
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use ocf_compliance::{validate_batch_with, BatchItem, BatchOptions, BatchOutcome, BatchResult, Engine, RunOutcome};
use ocf_convert::Encoding;

use crate::{display_name, load_config, read_document, OutputFormat};

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Documents to validate.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Baseline as `name@version`, or a profile name that is unique.
    #[arg(long, short)]
    pub baseline: String,

    /// Encoding for every input. Inferred per file when omitted.
    #[arg(long)]
    pub encoding: Option<Encoding>,

    /// Maximum concurrent validations. Defaults to the configured value.
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Per-document timeout in seconds. Defaults to the configured value.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Execute the batch subcommand. Exits 0 only if every document passed.
pub fn run_batch(args: &BatchArgs, config_path: Option<&Path>) -> Result<u8> {
    let config = load_config(config_path)?;
    let mut options = BatchOptions::from_config(&config);
    if let Some(concurrency) = args.concurrency {
        options.concurrency = concurrency.max(1);
    }
    if let Some(secs) = args.timeout_secs {
        options.timeout = Duration::from_secs(secs);
    }
    let engine = Arc::new(Engine::new(config).context("failed to initialize validation engine")?);

    let items = args
        .paths
        .iter()
        .map(|path| {
            let (bytes, encoding) = read_document(path, args.encoding)?;
            Ok(BatchItem {
                name: path.display().to_string(),
                bytes,
                encoding,
                baseline: args.baseline.clone(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let results = runtime.block_on(validate_batch_with(engine, items, options));

    match args.format {
        OutputFormat::Text => print!("{}", render_results(&results)),
        format => crate::emit(&results, format)?,
    }
    Ok(batch_exit_code(&results))
}

fn render_results(results: &[BatchResult]) -> String {
    let mut out = String::new();
    let mut passed = 0;
    for result in results {
        let name = display_name(Path::new(&result.name));
        match &result.outcome {
            BatchOutcome::Completed { run } => {
                if run.pass {
                    passed += 1;
                }
                out.push_str(&format!(
                    "{:<8} {name} ({} errors)\n",
                    run.outcome.as_str().to_uppercase(),
                    run.errors.len()
                ));
            }
            BatchOutcome::Failed { reason } => out.push_str(&format!("{:<8} {name}: {reason}\n", "ERROR")),
            BatchOutcome::TimedOut { after_ms } => {
                out.push_str(&format!("{:<8} {name} after {after_ms} ms\n", "TIMEOUT"))
            }
        }
    }
    out.push_str(&format!("{passed}/{} passed\n", results.len()));
    out
}

fn batch_exit_code(results: &[BatchResult]) -> u8 {
    let mut code = 0;
    for result in results {
        let item = match result.run() {
            Some(run) => crate::exit_code(run.outcome),
            None => crate::exit_code(RunOutcome::Fail),
        };
        code = code.max(item);
    }
    code
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(name: &str) -> BatchResult {
        BatchResult {
            name: name.to_string(),
            outcome: BatchOutcome::TimedOut { after_ms: 10 },
        }
    }

    #[test]
    fn empty_batch_exits_zero() {
        assert_eq!(batch_exit_code(&[]), 0);
        assert_eq!(render_results(&[]), "0/0 passed\n");
    }

    #[test]
    fn timeout_is_failure() {
        let results = vec![failed("plans/slow.json")];
        assert_eq!(batch_exit_code(&results), 1);
        let text = render_results(&results);
        assert!(text.starts_with("TIMEOUT  slow.json after 10 ms\n"));
        assert!(text.ends_with("0/1 passed\n"));
    }
}
