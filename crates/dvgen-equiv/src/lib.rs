//! # dvgen-equiv: Migration Equivalence Checker
//!
//! While validation moves from hand-written code to declarative tags, both
//! run side by side. This crate decides whether they agree.
//!
//! ```text
//! ErrorList A (declarative) ──┐
//!                             ├──► EquivalenceChecker ──► EquivalenceReport (PASS/FAIL + diff)
//! ErrorList B (reference) ────┘        ▲
//!                          Normalizer ─┘ ErrorMatcher
//! ```
//!
//! ## Crate Policy
//!
//! - Checking is a pure function of its inputs.
//! - Only rule loading can fail; a FAIL verdict is data, turned into an
//!   error only through [`EquivalenceReport::into_result`].

pub mod checker;
pub mod error;
pub mod matcher;
pub mod normalize;

pub use checker::{EquivalenceChecker, EquivalenceReport, MatchedPair};
pub use error::{EquivError, EquivalenceMismatch};
pub use matcher::ErrorMatcher;
pub use normalize::{NormalizationRule, Normalizer};
