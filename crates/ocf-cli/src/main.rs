//! # ocf CLI entry point
//!
//! Parses command-line arguments, installs the tracing subscriber and
//! dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ocf_cli::batch::{run_batch, BatchArgs};
use ocf_cli::convert::{run_convert, ConvertArgs};
use ocf_cli::digest::{run_digest, DigestArgs};
use ocf_cli::resolve::{run_resolve, ResolveArgs};
use ocf_cli::validate::{run_validate, ValidateArgs};

/// Compliance document validation and baseline resolution.
///
/// Resolves control baselines from catalogs and profiles, validates system
/// security plans against them, and converts documents between JSON, YAML
/// and XML without semantic loss.
#[derive(Parser, Debug)]
#[command(name = "ocf", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    /// Path to a YAML engine configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve a baseline and print its control set.
    Resolve(ResolveArgs),

    /// Validate a document against a baseline.
    Validate(ValidateArgs),

    /// Convert a document between encodings.
    Convert(ConvertArgs),

    /// Validate many documents concurrently.
    Batch(BatchArgs),

    /// Print the semantic digest of documents.
    Digest(DigestArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let config = cli.config.as_deref();
    let result = match &cli.command {
        Commands::Resolve(args) => run_resolve(args, config),
        Commands::Validate(args) => run_validate(args, config),
        Commands::Convert(args) => run_convert(args),
        Commands::Batch(args) => run_batch(args, config),
        Commands::Digest(args) => run_digest(args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing(verbose: u8, json: bool) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
