//! # Input Files
//!
//! Every input is read as YAML, which also accepts JSON documents.

use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;

use dvgen_core::{ErrorList, FeatureGateSnapshot, TypeUniverse};
use dvgen_rules::CompilerOptions;

/// Read and deserialize a YAML or JSON document.
pub fn read_document<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_yaml::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}

pub fn load_universe(path: &Path) -> anyhow::Result<TypeUniverse> {
    let universe: TypeUniverse = read_document(path)?;
    tracing::debug!(path = %path.display(), types = universe.len(), "loaded type universe");
    Ok(universe)
}

/// Compiler options from `path`, or the defaults.
pub fn load_options(path: Option<&Path>) -> anyhow::Result<CompilerOptions> {
    match path {
        Some(path) => CompilerOptions::load(path)
            .with_context(|| format!("failed to load compiler config {}", path.display())),
        None => Ok(CompilerOptions::default()),
    }
}

/// Gate snapshot from `path`; every gate is disabled when absent.
pub fn load_gates(path: Option<&Path>) -> anyhow::Result<FeatureGateSnapshot> {
    match path {
        Some(path) => read_document(path),
        None => Ok(FeatureGateSnapshot::new()),
    }
}

pub fn load_errors(path: &Path) -> anyhow::Result<ErrorList> {
    read_document(path)
}

pub fn load_value(path: &Path) -> anyhow::Result<serde_json::Value> {
    read_document(path)
}
