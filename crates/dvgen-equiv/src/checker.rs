//! # Equivalence Checker
//!
//! Compares the errors produced by declarative validation (A) with those of
//! the reference validation it replaces (B).
//!
//! 1. B errors marked covered-by-declarative or declarative-native are
//!    *expected*: each needs a counterpart in A. Other B errors pass
//!    through.
//! 2. A paths are rewritten by the [`Normalizer`].
//! 3. A is filtered to native errors and errors matching some expected B
//!    error. The rest are reported as ignored.
//! 4. Filtered A and expected B are paired one-to-one with the
//!    [`ErrorMatcher`]. Order does not matter; multiplicity does.
//!
//! The result is PASS when nothing is left unpaired on either side.

use std::fmt;

use serde::Serialize;

use dvgen_core::{ErrorList, ValidationError};

use crate::error::EquivalenceMismatch;
use crate::matcher::ErrorMatcher;
use crate::normalize::Normalizer;

#[derive(Debug, Clone, Default)]
pub struct EquivalenceChecker {
    normalizer: Normalizer,
    matcher: ErrorMatcher,
}

impl EquivalenceChecker {
    pub fn new(normalizer: Normalizer, matcher: ErrorMatcher) -> Self {
        Self {
            normalizer,
            matcher,
        }
    }

    pub fn matcher(&self) -> ErrorMatcher {
        self.matcher
    }

    pub fn check(&self, declarative: &ErrorList, reference: &ErrorList) -> EquivalenceReport {
        let (expected, passthrough): (Vec<&ValidationError>, Vec<&ValidationError>) = reference
            .iter()
            .partition(|e| e.is_covered_by_declarative() || e.is_declarative_native());

        let mut report = EquivalenceReport {
            matcher: self.matcher,
            passthrough: passthrough.into_iter().cloned().collect(),
            ..EquivalenceReport::default()
        };

        let mut candidates = Vec::new();
        for error in declarative.iter() {
            let normalized = error.relocated(self.normalizer.normalize(error.path()));
            let relevant = normalized.is_declarative_native()
                || expected.iter().any(|b| self.matcher.matches(&normalized, b));
            if relevant {
                candidates.push(normalized);
            } else {
                report.ignored_declarative.push(normalized);
            }
        }

        let mut used = vec![false; expected.len()];
        for a in candidates {
            let slot = expected
                .iter()
                .enumerate()
                .position(|(i, b)| !used[i] && self.matcher.matches(&a, b));
            match slot {
                Some(i) => {
                    used[i] = true;
                    report.matched.push(MatchedPair {
                        declarative: a,
                        reference: expected[i].clone(),
                    });
                }
                None => report.unmatched_declarative.push(a),
            }
        }
        report.unmatched_reference = expected
            .iter()
            .zip(&used)
            .filter(|(_, used)| !**used)
            .map(|(b, _)| (*b).clone())
            .collect();

        tracing::debug!(
            matched = report.matched.len(),
            unmatched_declarative = report.unmatched_declarative.len(),
            unmatched_reference = report.unmatched_reference.len(),
            passthrough = report.passthrough.len(),
            ignored = report.ignored_declarative.len(),
            pass = report.is_pass(),
            "equivalence check finished"
        );
        report
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedPair {
    pub declarative: ValidationError,
    pub reference: ValidationError,
}

/// Outcome of one equivalence check.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EquivalenceReport {
    #[serde(skip)]
    matcher: ErrorMatcher,
    pub matched: Vec<MatchedPair>,
    /// Filtered declarative errors with no reference counterpart.
    pub unmatched_declarative: Vec<ValidationError>,
    /// Expected reference errors with no declarative counterpart.
    pub unmatched_reference: Vec<ValidationError>,
    /// Reference errors not yet covered by declarative validation.
    pub passthrough: Vec<ValidationError>,
    /// Declarative errors outside the migrated surface.
    pub ignored_declarative: Vec<ValidationError>,
}

impl EquivalenceReport {
    pub fn is_pass(&self) -> bool {
        self.unmatched_declarative.is_empty() && self.unmatched_reference.is_empty()
    }

    pub fn unmatched(&self) -> usize {
        self.unmatched_declarative.len() + self.unmatched_reference.len()
    }

    /// Unmatched entries from both sides; empty on PASS.
    pub fn diff(&self) -> String {
        let mut out = String::new();
        if !self.unmatched_declarative.is_empty() {
            out.push_str("declarative errors without a reference counterpart:\n");
            for e in &self.unmatched_declarative {
                out.push_str(&format!("  + {}\n", self.matcher.describe(e)));
            }
        }
        if !self.unmatched_reference.is_empty() {
            out.push_str("reference errors without a declarative counterpart:\n");
            for e in &self.unmatched_reference {
                out.push_str(&format!("  - {}\n", self.matcher.describe(e)));
            }
        }
        out
    }

    /// # Errors
    ///
    /// Returns [`EquivalenceMismatch`] carrying the diff on FAIL.
    pub fn into_result(self) -> Result<Self, EquivalenceMismatch> {
        if self.is_pass() {
            Ok(self)
        } else {
            Err(EquivalenceMismatch {
                unmatched: self.unmatched(),
                diff: self.diff(),
            })
        }
    }
}

impl fmt::Display for EquivalenceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}: {} matched, {} passthrough, {} ignored",
            if self.is_pass() { "PASS" } else { "FAIL" },
            self.matched.len(),
            self.passthrough.len(),
            self.ignored_declarative.len()
        )?;
        f.write_str(&self.diff())
    }
}
