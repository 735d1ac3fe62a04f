//! # Digest Subcommand
//!
//! Prints the semantic digest of each document. The digest is independent
//! of encoding, key order and whitespace, so a JSON document and its XML
//! conversion print the same value.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use ocf_convert::Encoding;
use ocf_core::{semantic_digest, ContentDigest};

use crate::read_document;

#[derive(Args, Debug)]
pub struct DigestArgs {
    /// Documents to digest.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Encoding for every input. Inferred per file when omitted.
    #[arg(long)]
    pub encoding: Option<Encoding>,
}

/// Execute the digest subcommand.
pub fn run_digest(args: &DigestArgs) -> Result<u8> {
    for path in &args.paths {
        let digest = digest_file(path, args.encoding)?;
        println!("{digest}  {}", path.display());
    }
    Ok(0)
}

pub fn digest_file(path: &std::path::Path, encoding: Option<Encoding>) -> Result<ContentDigest> {
    let (bytes, encoding) = read_document(path, encoding)?;
    let tree = ocf_convert::decode(&bytes, encoding).with_context(|| format!("failed to parse {}", path.display()))?;
    semantic_digest(&tree).with_context(|| format!("failed to canonicalize {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_tree_same_digest_across_encodings() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("a.json");
        let yaml = dir.path().join("a.yaml");
        std::fs::write(&json, r#"{"b": 2, "a": {"c": true}}"#).unwrap();
        std::fs::write(&yaml, "a:\n  c: true\nb: 2\n").unwrap();
        assert_eq!(digest_file(&json, None).unwrap(), digest_file(&yaml, None).unwrap());
    }

    #[test]
    fn unparseable_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("a.json");
        std::fs::write(&json, "[").unwrap();
        assert!(digest_file(&json, None).is_err());
    }
}
