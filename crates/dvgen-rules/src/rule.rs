//! # Rules and Rule Trees
//!
//! A [`Rule`] is the executable form of one tag. Composed kinds (`eachVal`,
//! `eachKey`, `subfield`, `item`, conditional wrappers) hold exactly one
//! child. A [`RuleTree`] is the ordered list of top-level rules attached to
//! a field or type.

use serde::Serialize;

use dvgen_core::FeatureGates;

use crate::kind::{RuleKind, Stability};

/// Whether a conditional wrapper is active when its gate is on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    /// `ifEnabled`: active while the gate is enabled.
    Enabled,
    /// `ifDisabled`: active while the gate is disabled.
    Disabled,
}

/// The feature-gate condition of a conditional wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Condition {
    pub gate: String,
    pub polarity: Polarity,
}

impl Condition {
    pub fn if_enabled(gate: impl Into<String>) -> Self {
        Self {
            gate: gate.into(),
            polarity: Polarity::Enabled,
        }
    }

    pub fn if_disabled(gate: impl Into<String>) -> Self {
        Self {
            gate: gate.into(),
            polarity: Polarity::Disabled,
        }
    }

    /// Evaluate against a gate snapshot.
    pub fn holds(&self, gates: &dyn FeatureGates) -> bool {
        let enabled = gates.is_enabled(&self.gate);
        match self.polarity {
            Polarity::Enabled => enabled,
            Polarity::Disabled => !enabled,
        }
    }
}

/// A resolved, executable unit derived from one tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    kind: RuleKind,
    stability: Stability,
    #[serde(skip_serializing_if = "Option::is_none")]
    condition: Option<Condition>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<Rule>,
    origin: String,
    tag: String,
}

impl Rule {
    /// A leaf rule.
    pub fn new(kind: RuleKind, origin: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            stability: kind.stability(),
            kind,
            condition: None,
            children: Vec::new(),
            origin: origin.into(),
            tag: tag.into(),
        }
    }

    /// A composed rule wrapping `child`.
    pub fn composed(
        kind: RuleKind,
        child: Rule,
        origin: impl Into<String>,
        tag: impl Into<String>,
    ) -> Self {
        Self {
            children: vec![child],
            ..Self::new(kind, origin, tag)
        }
    }

    /// A conditional wrapper. The origin is the child's.
    pub fn conditional(condition: Condition, child: Rule, tag: impl Into<String>) -> Self {
        let origin = child.origin.clone();
        Self {
            condition: Some(condition),
            ..Self::composed(RuleKind::ConditionalWrapper, child, origin, tag)
        }
    }

    pub fn kind(&self) -> &RuleKind {
        &self.kind
    }

    pub fn stability(&self) -> Stability {
        self.stability
    }

    /// Set only on conditional wrappers.
    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    pub fn children(&self) -> &[Rule] {
        &self.children
    }

    /// The single child of a composed rule.
    pub fn child(&self) -> Option<&Rule> {
        self.children.first()
    }

    /// The string placed into `ValidationError::origin`.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// The source tag text.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn is_conditional(&self) -> bool {
        self.condition.is_some()
    }

    /// Strip conditional wrappers without evaluating them.
    pub fn innermost(&self) -> &Rule {
        let mut rule = self;
        while rule.is_conditional() {
            match rule.child() {
                Some(child) => rule = child,
                None => break,
            }
        }
        rule
    }

    /// Visit this rule and every descendant, depth first. Enum exclusions
    /// count as descendants.
    pub fn visit<'a>(&'a self, f: &mut dyn FnMut(&'a Rule)) {
        f(self);
        if let RuleKind::Enum(members) = &self.kind {
            for member in members {
                for rule in &member.exclusions {
                    rule.visit(f);
                }
            }
        }
        for child in &self.children {
            child.visit(f);
        }
    }
}

/// Ordered top-level rules of one field or type.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RuleTree {
    rules: Vec<Rule>,
}

impl RuleTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    pub fn as_slice(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether any unconditional top-level rule satisfies `pred`.
    pub fn has(&self, pred: impl Fn(&RuleKind) -> bool) -> bool {
        self.rules
            .iter()
            .any(|r| !r.is_conditional() && pred(r.kind()))
    }

    /// Every rule in the tree, recursively.
    pub fn all_rules(&self) -> Vec<&Rule> {
        let mut out = Vec::new();
        for rule in &self.rules {
            rule.visit(&mut |r| out.push(r));
        }
        out
    }
}

impl FromIterator<Rule> for RuleTree {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a RuleTree {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
