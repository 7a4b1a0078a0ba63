//! # Equiv Subcommand
//!
//! Compares a declarative error list with a reference error list and
//! prints the equivalence report.

use std::path::PathBuf;

use clap::Args;

use dvgen_equiv::{EquivalenceChecker, ErrorMatcher, Normalizer};

use crate::input;

/// Arguments for the equiv subcommand.
#[derive(Args, Debug)]
pub struct EquivArgs {
    /// Errors produced by declarative validation (JSON or YAML list).
    #[arg(long)]
    pub declarative: PathBuf,

    /// Errors produced by the reference validation.
    #[arg(long)]
    pub reference: PathBuf,

    /// Path normalization rules (YAML list of pattern/replacement).
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// Also require equal origins.
    #[arg(long)]
    pub by_origin: bool,

    /// Also require equal bad values.
    #[arg(long)]
    pub by_value: bool,
}

/// Returns `Ok(false)` on FAIL.
pub fn run(args: &EquivArgs) -> anyhow::Result<bool> {
    let declarative = input::load_errors(&args.declarative)?;
    let reference = input::load_errors(&args.reference)?;
    let normalizer = match &args.rules {
        Some(path) => Normalizer::load(path)?,
        None => Normalizer::default(),
    };
    let matcher = ErrorMatcher {
        by_origin: args.by_origin,
        by_value: args.by_value,
        by_detail: false,
    };

    let report = EquivalenceChecker::new(normalizer, matcher).check(&declarative, &reference);
    print!("{report}");
    Ok(report.is_pass())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn file(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn normalized_lists_pass() {
        let declarative = file(
            r#"[{"path": "requests[0].selectors", "kind": "TooMany", "bad_value": 33, "origin": "maxItems"}]"#,
        );
        let reference = file(
            r#"[{"path": "requests[0].exactly.selectors", "kind": "TooMany", "covered_by_declarative": true}]"#,
        );
        let rules = file("- pattern: '^requests\\[(\\d+)\\]\\.selectors'\n  replacement: 'requests[$1].exactly.selectors'\n");
        let mut args = EquivArgs {
            declarative: declarative.path().to_path_buf(),
            reference: reference.path().to_path_buf(),
            rules: Some(rules.path().to_path_buf()),
            by_origin: false,
            by_value: false,
        };
        assert!(run(&args).unwrap());

        args.rules = None;
        assert!(!run(&args).unwrap());
    }
}
