//! # dvgen-core: Foundational Types for Declarative Validation
//!
//! This crate is the leaf of the dvgen dependency graph. It defines the
//! vocabulary shared by the tag compiler, the rule executor and the
//! equivalence checker.
//!
//! ## Key Types
//!
//! 1. **[`FieldPath`]**: Ordered, structurally comparable path of field
//!    names, indices and identity keys. Renders as `spec.items[0].name`.
//!
//! 2. **[`ValidationError`] / [`ErrorList`]**: Runtime error model.
//!    Errors are immutable values: marking flags are applied by
//!    value-consuming constructors, never by mutating a shared list.
//!
//! 3. **[`FeatureGates`]**: Read-only view of feature-gate state. The
//!    executor receives an explicit snapshot per call; there is no global.
//!
//! 4. **[`TypeUniverse`]**: Static type information supplied by the
//!    introspection collaborator: struct and alias definitions, their raw
//!    tags, and explicitly registered enum constants.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `dvgen-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod gates;
pub mod path;
pub mod types;
pub mod validation;

// Re-export primary types for ergonomic imports.
pub use error::{PathParseError, TypeError, TypeRefParseError};
pub use gates::{FeatureGateRegistry, FeatureGateSnapshot, FeatureGates};
pub use path::{FieldPath, PathSegment};
pub use types::{
    ConstDef, FieldDef, Resolved, ScalarKind, Shape, TypeDef, TypeDefKind, TypeRef, TypeUniverse,
};
pub use validation::{ErrorKind, ErrorList, ValidationError};
