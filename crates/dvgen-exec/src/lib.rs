//! # dvgen-exec: Rule Executor
//!
//! Validates JSON object instances against a [`dvgen_rules::CompiledSchema`].
//!
//! ```text
//! CompiledSchema ──► TypeValidator ──► validate(new, old?, gates) ──► ErrorList
//! ```
//!
//! Every violation becomes one [`dvgen_core::ValidationError`]; evaluation
//! always runs to completion. Supplying the previous object turns the call
//! into an update, which enables ratcheting and transition rules.
//!
//! ## Crate Policy
//!
//! - No I/O and no global state. Feature-gate state arrives with each call.
//! - Identical inputs give identical error lists, in the same order.
//! - A value that does not fit its compiled shape yields one `Invalid`
//!   error and is not descended into.

pub mod error;
pub mod executor;
pub mod format;

mod collections;
mod scalar;
mod union;
mod value;

pub use error::ExecError;
pub use executor::{validate, SchemaValidators, TypeValidator};
