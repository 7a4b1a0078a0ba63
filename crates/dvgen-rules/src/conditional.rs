//! # Conditional Resolver
//!
//! The single place where feature-gate state is consulted. Every decision
//! is made against the snapshot passed to [`ConditionalResolver::new`];
//! nothing is cached across calls.
//!
//! ## Composition
//!
//! - Nested wrappers combine with AND: every enclosing condition must hold.
//! - Sibling wrappers on distinct rules are independent.
//! - An enum constant carrying several exclusions is excluded when any one
//!   of them is active (OR).

use dvgen_core::FeatureGates;

use crate::kind::{EnumMember, RuleKind};
use crate::rule::{Rule, RuleTree};

/// Resolves conditional wrappers against one gate snapshot.
#[derive(Clone, Copy)]
pub struct ConditionalResolver<'g> {
    gates: &'g dyn FeatureGates,
}

impl<'g> ConditionalResolver<'g> {
    pub fn new(gates: &'g dyn FeatureGates) -> Self {
        Self { gates }
    }

    /// Whether every condition on the wrapper chain of `rule` holds.
    pub fn is_active(&self, rule: &Rule) -> bool {
        self.resolve(rule).is_some()
    }

    /// The innermost rule when the whole wrapper chain is active.
    pub fn resolve<'r>(&self, rule: &'r Rule) -> Option<&'r Rule> {
        let mut current = rule;
        while let Some(condition) = current.condition() {
            if !condition.holds(self.gates) {
                tracing::trace!(gate = %condition.gate, tag = %rule.tag(), "conditional rule inactive");
                return None;
            }
            current = current.child()?;
        }
        Some(current)
    }

    /// Active rules of a tree in declaration order, wrappers stripped.
    pub fn active<'r>(&self, tree: &'r RuleTree) -> Vec<&'r Rule> {
        tree.iter().filter_map(|r| self.resolve(r)).collect()
    }

    /// Whether any of the member's exclusions is active.
    pub fn is_excluded(&self, member: &EnumMember) -> bool {
        member
            .exclusions
            .iter()
            .filter_map(|r| self.resolve(r))
            .any(|r| matches!(r.kind(), RuleKind::EnumExclude))
    }

    /// Values currently allowed, in declaration order.
    pub fn allowed_values<'r>(&self, members: &'r [EnumMember]) -> Vec<&'r str> {
        members
            .iter()
            .filter(|m| !self.is_excluded(m))
            .map(|m| m.value.as_str())
            .collect()
    }
}

impl std::fmt::Debug for ConditionalResolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConditionalResolver").finish_non_exhaustive()
    }
}
