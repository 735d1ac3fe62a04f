//! # Convert Subcommand
//!
//! Converts a document between encodings. Output is only written once the
//! converted bytes have been re-read and digest-matched against the input.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use ocf_convert::Encoding;

use crate::{read_document, OutputFormat};

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Document to convert.
    pub input: PathBuf,

    /// Source encoding. Inferred from the input extension when omitted.
    #[arg(long)]
    pub from: Option<Encoding>,

    /// Target encoding. Inferred from `--output` when omitted.
    #[arg(long, required_unless_present = "output")]
    pub to: Option<Encoding>,

    /// Write the converted document here instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Format of the conversion record printed to stderr.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub record: OutputFormat,
}

/// Execute the convert subcommand.
pub fn run_convert(args: &ConvertArgs) -> Result<u8> {
    let (bytes, source) = read_document(&args.input, args.from)?;
    let target = match (args.to, &args.output) {
        (Some(target), _) => target,
        (None, Some(output)) => Encoding::from_path(output)
            .with_context(|| format!("cannot infer target encoding of {}; pass --to", output.display()))?,
        (None, None) => anyhow::bail!("--to is required when writing to stdout"),
    };

    let (converted, record) = ocf_convert::convert(&bytes, source, target)
        .with_context(|| format!("failed to convert {}", args.input.display()))?;

    match &args.output {
        Some(output) => std::fs::write(output, &converted)
            .with_context(|| format!("failed to write {}", output.display()))?,
        None => std::io::stdout()
            .write_all(&converted)
            .context("failed to write converted document")?,
    }

    match args.record {
        OutputFormat::Text => eprintln!(
            "{source} -> {target}: {} ({} -> {} bytes)",
            record.source_digest, record.source_bytes, record.target_bytes
        ),
        OutputFormat::Json => eprintln!(
            "{}",
            serde_json::to_string_pretty(&record).context("failed to serialize conversion record")?
        ),
        OutputFormat::Yaml => eprint!(
            "{}",
            serde_yaml::to_string(&record).context("failed to serialize conversion record")?
        ),
    }
    Ok(0)
}
