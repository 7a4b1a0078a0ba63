//! # Feature Gates
//!
//! The executor never consults process-global flag state. Callers acquire a
//! consistent read view and pass it explicitly as a [`FeatureGates`]
//! implementation; the view must not change for the duration of the call.
//!
//! Two concrete types are provided:
//!
//! - [`FeatureGateSnapshot`]: name to enabled map, the runtime view.
//! - [`FeatureGateRegistry`]: the set of known gate names, consulted at
//!   compile time to reject conditions naming gates that do not exist.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Read-only view of feature-gate state.
pub trait FeatureGates {
    /// Whether the named gate is enabled. Unknown gates are disabled.
    fn is_enabled(&self, name: &str) -> bool;
}

impl<T: FeatureGates + ?Sized> FeatureGates for &T {
    fn is_enabled(&self, name: &str) -> bool {
        (**self).is_enabled(name)
    }
}

/// An immutable-per-call map of gate name to enabled state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureGateSnapshot {
    gates: BTreeMap<String, bool>,
}

impl FeatureGateSnapshot {
    /// A snapshot in which every gate is disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a snapshot with `name` set to `enabled`.
    pub fn with(mut self, name: impl Into<String>, enabled: bool) -> Self {
        self.gates.insert(name.into(), enabled);
        self
    }

    /// Set `name` to `enabled`.
    pub fn set(&mut self, name: impl Into<String>, enabled: bool) {
        self.gates.insert(name.into(), enabled);
    }

    /// Names of every gate explicitly present in the snapshot.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.gates.keys().map(String::as_str)
    }
}

impl FeatureGates for FeatureGateSnapshot {
    fn is_enabled(&self, name: &str) -> bool {
        self.gates.get(name).copied().unwrap_or(false)
    }
}

impl<S: Into<String>> FromIterator<(S, bool)> for FeatureGateSnapshot {
    fn from_iter<I: IntoIterator<Item = (S, bool)>>(iter: I) -> Self {
        Self {
            gates: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// The set of gate names known at compile time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureGateRegistry {
    names: BTreeSet<String>,
}

impl FeatureGateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a gate name.
    pub fn register(&mut self, name: impl Into<String>) {
        self.names.insert(name.into());
    }

    /// Whether the gate name is known.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for FeatureGateRegistry {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_gates_are_disabled() {
        let gates = FeatureGateSnapshot::new().with("FeatureA", true);
        assert!(gates.is_enabled("FeatureA"));
        assert!(!gates.is_enabled("FeatureB"));
    }

    #[test]
    fn explicit_false_is_disabled() {
        let gates: FeatureGateSnapshot = [("FeatureA", false)].into_iter().collect();
        assert!(!gates.is_enabled("FeatureA"));
        assert_eq!(gates.names().collect::<Vec<_>>(), vec!["FeatureA"]);
    }

    #[test]
    fn snapshot_deserializes_from_map() {
        let gates: FeatureGateSnapshot =
            serde_json::from_str(r#"{"FeatureA": true, "FeatureB": false}"#).unwrap();
        assert!(gates.is_enabled("FeatureA"));
        assert!(!gates.is_enabled("FeatureB"));
    }

    #[test]
    fn trait_object_and_reference_views() {
        let gates = FeatureGateSnapshot::new().with("X", true);
        let dyn_view: &dyn FeatureGates = &gates;
        assert!(dyn_view.is_enabled("X"));
        assert!((&gates).is_enabled("X"));
    }

    #[test]
    fn registry_membership() {
        let registry: FeatureGateRegistry = ["FeatureA", "FeatureB"].into_iter().collect();
        assert!(registry.contains("FeatureA"));
        assert!(!registry.contains("FeatureZ"));
        assert_eq!(registry.len(), 2);
    }
}
