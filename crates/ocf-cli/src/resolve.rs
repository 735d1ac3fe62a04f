//! # Resolve Subcommand
//!
//! Resolves a baseline from the configured content and prints it.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use ocf_catalog::{ContentSnapshot, ControlOrigin, ResolvedBaseline};

use crate::{load_config, OutputFormat};

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Baseline as `name@version`, or a profile name that is unique.
    /// Omit together with `--list` to list profiles.
    #[arg(required_unless_present = "list")]
    pub baseline: Option<String>,

    /// List the profiles available in the content directory.
    #[arg(long)]
    pub list: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Execute the resolve subcommand.
pub fn run_resolve(args: &ResolveArgs, config_path: Option<&Path>) -> Result<u8> {
    let config = load_config(config_path)?;
    let snapshot = ContentSnapshot::load_dir(&config.content_dir, config.resolve_options())
        .with_context(|| format!("failed to load content from {}", config.content_dir.display()))?;

    if args.list {
        for profile in snapshot.profiles() {
            let title = profile.title.as_deref().unwrap_or("");
            println!("{:<24} {title}", profile.id().to_string());
        }
        return Ok(0);
    }

    let Some(requested) = args.baseline.as_deref() else {
        anyhow::bail!("a baseline is required unless --list is given");
    };
    let (baseline, _) = snapshot.baseline(requested);
    let baseline = baseline.with_context(|| format!("failed to resolve baseline {requested}"))?;

    match args.format {
        OutputFormat::Text => print!("{}", render_baseline(&baseline)?),
        format => crate::emit(baseline.as_ref(), format)?,
    }
    Ok(0)
}

fn render_baseline(baseline: &ResolvedBaseline) -> Result<String> {
    let digest = baseline.digest().context("failed to digest baseline")?;
    let catalogs: Vec<String> = baseline.catalogs.iter().map(|c| c.to_string()).collect();
    let mut out = format!(
        "baseline:  {}\ncatalogs:  {}\nregistry:  {}\nroles:     {}\ndigest:    {digest}\ncontrols:  {}\n",
        baseline.profile,
        catalogs.join(", "),
        baseline.registry_version,
        baseline.required_roles.join(", "),
        baseline.len(),
    );
    for (id, resolved) in &baseline.controls {
        let origin = match &resolved.origin {
            ControlOrigin::Catalog(catalog) => catalog.to_string(),
            ControlOrigin::Added => "added".to_string(),
        };
        out.push_str(&format!("  {:<10} {:<48} {origin}\n", id.to_string(), resolved.control.title));
    }
    Ok(out)
}
