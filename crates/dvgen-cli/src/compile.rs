//! # Compile Subcommand
//!
//! Compiles every type of a schema file and prints the resulting rule
//! trees, either as an indented listing or as JSON.

use std::fmt::Write as _;
use std::path::PathBuf;

use clap::Args;

use dvgen_rules::{CompiledSchema, Compiler, RuleTree, TypeBody};

use crate::input;

/// Arguments for the compile subcommand.
#[derive(Args, Debug)]
pub struct CompileArgs {
    /// Type universe (YAML or JSON).
    #[arg(long)]
    pub schema: PathBuf,

    /// Compiler options (YAML).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the compiled schema as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Returns `Ok(false)` when at least one type was rejected.
pub fn run(args: &CompileArgs) -> anyhow::Result<bool> {
    let universe = input::load_universe(&args.schema)?;
    let options = input::load_options(args.config.as_deref())?;
    let compilation = Compiler::new(options).compile(&universe);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&compilation.schema)?);
    } else {
        print!("{}", render(&compilation.schema));
    }
    for error in &compilation.errors {
        eprintln!("rejected: {error}");
    }
    Ok(compilation.is_ok())
}

/// Indented listing of every type and its rules.
pub fn render(schema: &CompiledSchema) -> String {
    let mut out = String::new();
    for ty in schema.iter() {
        let _ = writeln!(out, "{}", ty.name);
        write_rules(&mut out, "  (type)", &ty.rules);
        match &ty.body {
            TypeBody::Struct(body) => {
                for field in &body.fields {
                    write_rules(&mut out, &format!("  {}", field.json_name), &field.rules);
                }
                for union in &body.unions {
                    let members: Vec<&str> = union.members.iter().map(|m| m.name.as_str()).collect();
                    let _ = writeln!(out, "  union {:?}: {}", union.name, members.join(", "));
                }
                for group in &body.zero_or_one {
                    let members: Vec<&str> = group.members.iter().map(|m| m.name.as_str()).collect();
                    let _ = writeln!(out, "  zeroOrOneOf {:?}: {}", group.name, members.join(", "));
                }
            }
            TypeBody::Alias(_) => {}
        }
    }
    out
}

fn write_rules(out: &mut String, label: &str, rules: &RuleTree) {
    if rules.is_empty() {
        return;
    }
    let tags: Vec<&str> = rules.iter().map(|r| r.tag()).collect();
    let _ = writeln!(out, "{label}: {}", tags.join(" "));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SCHEMA: &str = r#"
- name: Widget
  kind: struct
  fields:
    - name: Name
      type: string
      tags: ["+k8s:required", "+k8s:maxLength=8"]
- name: Broken
  kind: struct
  fields:
    - name: Count
      type: int
      tags: ["+k8s:maxLength=3"]
"#;

    fn schema_file(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn rejected_type_fails_the_command() {
        let f = schema_file(SCHEMA);
        let args = CompileArgs {
            schema: f.path().to_path_buf(),
            config: None,
            json: true,
        };
        assert!(!run(&args).unwrap());
    }

    #[test]
    fn render_lists_field_tags() {
        let f = schema_file(SCHEMA);
        let universe = input::load_universe(f.path()).unwrap();
        let compilation = Compiler::default().compile(&universe);
        let text = render(&compilation.schema);
        assert_eq!(text, "Widget\n  name: +k8s:required +k8s:maxLength=8\n");
    }
}
