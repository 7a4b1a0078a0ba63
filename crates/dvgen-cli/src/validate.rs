//! # Validate Subcommand
//!
//! Compiles the schema, validates one object of the requested type and
//! prints the error list as JSON.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use dvgen_exec::SchemaValidators;
use dvgen_rules::Compiler;

use crate::input;

/// Arguments for the validate subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Type universe (YAML or JSON).
    #[arg(long)]
    pub schema: PathBuf,

    /// Root type of the object.
    #[arg(long = "type")]
    pub type_name: String,

    /// Object to validate.
    #[arg(long)]
    pub object: PathBuf,

    /// Previous version of the object; makes the operation an update.
    #[arg(long)]
    pub old: Option<PathBuf>,

    /// Feature-gate snapshot: a map of gate name to enabled.
    #[arg(long)]
    pub gates: Option<PathBuf>,

    /// Compiler options (YAML).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Returns `Ok(false)` when the object has validation errors.
pub fn run(args: &ValidateArgs) -> anyhow::Result<bool> {
    let universe = input::load_universe(&args.schema)?;
    let options = input::load_options(args.config.as_deref())?;
    let compilation = Compiler::new(options).compile(&universe);
    if let Some(rejected) = compilation
        .errors
        .iter()
        .find(|e| e.type_name == args.type_name)
    {
        anyhow::bail!("type '{}' was rejected: {rejected}", args.type_name);
    }

    let new = input::load_value(&args.object)?;
    let old = args.old.as_deref().map(input::load_value).transpose()?;
    let gates = input::load_gates(args.gates.as_deref())?;

    let validator = compilation
        .schema
        .validator(&args.type_name)
        .with_context(|| format!("type '{}' is not defined in the schema", args.type_name))?;
    let errors = validator.validate(&new, old.as_ref(), &gates);

    println!("{}", serde_json::to_string_pretty(&errors)?);
    Ok(errors.is_empty())
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

    fn schema() -> tempfile::NamedTempFile {
        file(
            r#"
- name: Widget
  kind: struct
  fields:
    - name: Name
      type: string
      tags: ["+k8s:required"]
    - name: Extra
      type: "*string"
      tags: ["+k8s:ifEnabled(FeatureA)=+k8s:required"]
"#,
        )
    }

    fn args(schema: &tempfile::NamedTempFile, object: &tempfile::NamedTempFile) -> ValidateArgs {
        ValidateArgs {
            schema: schema.path().to_path_buf(),
            type_name: "Widget".into(),
            object: object.path().to_path_buf(),
            old: None,
            gates: None,
            config: None,
        }
    }

    #[test]
    fn valid_object_succeeds() {
        let schema = schema();
        let object = file(r#"{"name": "w"}"#);
        assert!(run(&args(&schema, &object)).unwrap());
    }

    #[test]
    fn gates_file_enables_conditional_rules() {
        let schema = schema();
        let object = file(r#"{"name": "w"}"#);
        let gates = file("FeatureA: true\n");
        let mut args = args(&schema, &object);
        args.gates = Some(gates.path().to_path_buf());
        assert!(!run(&args).unwrap());
    }

    #[test]
    fn unknown_type_is_an_error() {
        let schema = schema();
        let object = file("{}");
        let mut args = args(&schema, &object);
        args.type_name = "Missing".into();
        assert!(run(&args).is_err());
    }
}
