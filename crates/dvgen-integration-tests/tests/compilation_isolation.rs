//! # Compilation Isolation
//!
//! A type rejected by the compiler does not prevent the rest of the
//! universe from compiling or validating.

use dvgen_core::{FeatureGateSnapshot, FieldDef, TypeDef, TypeRef, TypeUniverse};
use dvgen_exec::SchemaValidators;
use dvgen_rules::{BuildError, Compiler};
use dvgen_tags::{parse_tag, Scope};
use serde_json::json;

fn universe() -> TypeUniverse {
    let ty = |s: &str| TypeRef::parse(s).unwrap();
    vec![
        TypeDef::structure(
            "Good",
            vec![FieldDef::new("Name", ty("string")).with_tags(["+k8s:required"])],
        ),
        TypeDef::structure(
            "Unparsable",
            vec![FieldDef::new("Name", ty("string")).with_tags(["+k8s:required("])],
        ),
        TypeDef::structure(
            "WrongDomain",
            vec![FieldDef::new("Count", ty("int")).with_tags(["+k8s:maxItems=3"])],
        ),
    ]
    .into()
}

#[test]
fn rejected_types_are_reported_individually() {
    let compilation = Compiler::default().compile(&universe());
    let mut rejected: Vec<&str> = compilation.errors.iter().map(|e| e.type_name.as_str()).collect();
    rejected.sort_unstable();
    assert_eq!(rejected, vec!["Unparsable", "WrongDomain"]);
    assert!(compilation.schema.contains("Good"));
    assert_eq!(compilation.schema.len(), 1);

    let wrong = compilation
        .errors
        .iter()
        .find(|e| e.type_name == "WrongDomain")
        .unwrap();
    assert!(matches!(wrong.source, BuildError::IncompatibleType { .. }));
    assert_eq!(wrong.field.as_deref(), Some("Count"));
}

#[test]
fn accepted_types_still_validate() {
    let compilation = Compiler::default().compile(&universe());
    let gates = FeatureGateSnapshot::new();
    let good = compilation.schema.validator("Good").unwrap();
    assert_eq!(good.validate(&json!({}), None, &gates).len(), 1);
    assert!(compilation.schema.validator("WrongDomain").is_none());
}

#[test]
fn tags_in_other_namespaces_are_ignored() {
    let universe: TypeUniverse = vec![TypeDef::structure(
        "Tagged",
        vec![FieldDef::new("Name", TypeRef::parse("string").unwrap())
            .with_tags(["+openapi:maxLength=1", "+k8s:maxLength=3"])],
    )]
    .into();
    let schema = Compiler::default().compile(&universe).into_result().unwrap();
    let errors = schema
        .validator("Tagged")
        .unwrap()
        .validate(&json!({"name": "ab"}), None, &FeatureGateSnapshot::new());
    assert!(errors.is_empty(), "{errors}");

    let tag = parse_tag("+openapi:maxLength=1", Scope::Field).unwrap();
    assert!(!tag.in_namespace("k8s"));
}
