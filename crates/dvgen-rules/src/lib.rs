//! # dvgen-rules: Rule Model and Type Compiler
//!
//! Turns tagged type definitions into executable rule trees.
//!
//! ## Pipeline
//!
//! ```text
//! TypeUniverse ──► RuleBuilder ──► RuleTree per field/type
//!                       │
//!                       └──► Compiler ──► CompiledSchema (plans, lists, unions)
//! ```
//!
//! - [`RuleBuilder`] parses each tag, checks scope and value-domain
//!   compatibility, and recursively builds composed payloads.
//! - [`ConditionalResolver`] decides, per call and per gate snapshot, which
//!   conditional rules are active.
//! - [`Compiler`] compiles every type of a universe; a rejected type does
//!   not stop the others.
//!
//! ## Crate Policy
//!
//! - Rules and compiled schemas are immutable once built and are
//!   `Send + Sync`.
//! - Feature-gate state is read only through [`ConditionalResolver`].

pub mod builder;
pub mod compile;
pub mod conditional;
pub mod error;
pub mod kind;
pub mod options;
pub mod rule;

pub use builder::RuleBuilder;
pub use compile::{
    Compilation, CompiledField, CompiledSchema, CompiledStruct, CompiledType, Compiler,
    ElementIdentity, ListSemantics, TypeBody, UnionMemberSpec, UnionSpec, ValuePlan, ValueShape,
};
pub use conditional::ConditionalResolver;
pub use error::{BuildError, CompileError, ConfigError};
pub use kind::{
    render_identity, EnumMember, Format, ItemSelector, ListType, RuleKind, Stability, UniqueMode,
    UpdateOp,
};
pub use options::{CompilerOptions, DEFAULT_NAMESPACE};
pub use rule::{Condition, Polarity, Rule, RuleTree};
