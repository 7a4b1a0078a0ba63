//! # Conditional Enum Exclusions
//!
//! The `Phase` fixture declares constants A..F with exclusions under every
//! combination of two gates. For each combination, every declared value is
//! accepted exactly when it is not excluded, and rejections list the values
//! still allowed in declaration order.

use dvgen_core::{ConstDef, ErrorKind, FeatureGateSnapshot, FieldDef, TypeDef, TypeRef, TypeUniverse};
use dvgen_exec::validate;
use dvgen_rules::{CompiledSchema, Compiler};
use serde_json::json;

const VALUES: [&str; 6] = ["A", "B", "C", "D", "E", "F"];

fn schema() -> CompiledSchema {
    let universe: TypeUniverse = vec![
        TypeDef::alias("Phase", TypeRef::parse("string").unwrap())
            .with_tags(["+k8s:enum"])
            .with_constants(vec![
                ConstDef::new("PhaseA", "A").with_tags(["+k8s:ifEnabled(Alpha)=+k8s:enumExclude"]),
                ConstDef::new("PhaseB", "B").with_tags(["+k8s:ifDisabled(Alpha)=+k8s:enumExclude"]),
                ConstDef::new("PhaseC", "C").with_tags(["+k8s:ifEnabled(Beta)=+k8s:enumExclude"]),
                ConstDef::new("PhaseD", "D")
                    .with_tags(["+k8s:ifEnabled(Alpha)=+k8s:ifEnabled(Beta)=+k8s:enumExclude"]),
                ConstDef::new("PhaseE", "E").with_tags([
                    "+k8s:ifEnabled(Alpha)=+k8s:enumExclude",
                    "+k8s:ifDisabled(Beta)=+k8s:enumExclude",
                ]),
                ConstDef::new("PhaseF", "F"),
            ]),
        TypeDef::structure(
            "Job",
            vec![FieldDef::new("Phase", TypeRef::parse("Phase").unwrap())],
        ),
    ]
    .into();
    Compiler::default().compile(&universe).into_result().unwrap()
}

/// Exclusion model: nested conditions are ANDed, sibling conditions ORed.
fn excluded(value: &str, alpha: bool, beta: bool) -> bool {
    match value {
        "A" => alpha,
        "B" => !alpha,
        "C" => beta,
        "D" => alpha && beta,
        "E" => alpha || !beta,
        _ => false,
    }
}

#[test]
fn every_value_under_every_gate_combination() {
    let schema = schema();
    for alpha in [false, true] {
        for beta in [false, true] {
            let gates = FeatureGateSnapshot::new().with("Alpha", alpha).with("Beta", beta);
            let allowed: Vec<&str> =
                VALUES.iter().copied().filter(|v| !excluded(v, alpha, beta)).collect();
            let supported = allowed
                .iter()
                .map(|v| format!("\"{v}\""))
                .collect::<Vec<_>>()
                .join(", ");

            for value in VALUES {
                let errors =
                    validate(&schema, "Job", &json!({"phase": value}), None, &gates).unwrap();
                if excluded(value, alpha, beta) {
                    assert_eq!(errors.len(), 1, "alpha={alpha} beta={beta} value={value}");
                    let err = &errors.as_slice()[0];
                    assert_eq!(err.kind(), ErrorKind::NotSupported);
                    assert_eq!(err.path().to_string(), "phase");
                    assert_eq!(err.bad_value(), Some(&json!(value)));
                    assert_eq!(err.detail(), format!("supported values: {supported}"));
                } else {
                    assert!(
                        errors.is_empty(),
                        "alpha={alpha} beta={beta} value={value}: {errors}"
                    );
                }
            }
        }
    }
}

#[test]
fn undeclared_value_is_never_supported() {
    let schema = schema();
    let gates = FeatureGateSnapshot::new();
    let errors = validate(&schema, "Job", &json!({"phase": "Z"}), None, &gates).unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.as_slice()[0].origin(), "enum");
}

#[test]
fn unchanged_excluded_value_ratchets() {
    let schema = schema();
    let gates = FeatureGateSnapshot::new().with("Alpha", true);
    let obj = json!({"phase": "A"});
    assert!(validate(&schema, "Job", &obj, Some(&obj), &gates).unwrap().is_empty());
}
