// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Hierarchy validation for layered node graphs.
//!
//! Every input of a node must live on a strictly lower layer than the node
//! itself. The validator walks the whole registry once and reports every
//! violation it finds, so a configuration author sees the complete list in a
//! single run.
//!
//! # Rules
//!
//! For a node `N` and each declared input `I`:
//!
//! * `I` is a declared raw source - always valid (raw sources are layer -1)
//! * `I` is not registered - [`ViolationKind::UnregisteredDependency`]
//! * `layer(I) == layer(N)` - [`ViolationKind::HorizontalReference`]
//! * `layer(I) > layer(N)` - [`ViolationKind::BackwardReference`]
//!
//! Because layers strictly decrease along every edge, a registry that passes
//! validation is acyclic. The compiler still detects cycles on its own, since
//! it may be run on unvalidated registries.
//!
//! # Example
//!
//! ```rust
//! use pkg_dag::config::{validate_hierarchy, NodeDefinition, NodeRegistry, ViolationKind};
//! use pkg_dag::functions::{Combinator, FunctionKind};
//!
//! let mut registry = NodeRegistry::new();
//! registry.register(NodeDefinition::new("110^1-000".parse().unwrap(), FunctionKind::RawInput)).unwrap();
//! registry.register(
//!     NodeDefinition::new("110^1-001".parse().unwrap(), FunctionKind::Combinator(Combinator::Sign))
//!         .with_inputs(vec!["110^1-000".parse().unwrap()]),
//! ).unwrap();
//!
//! let report = validate_hierarchy(&registry);
//! assert!(!report.is_ok());
//! assert_eq!(report.violations[0].kind, ViolationKind::HorizontalReference);
//! ```

use std::fmt;

use crate::config::NodeRegistry;
use crate::identifier::Identifier;
use crate::observability::messages::validation::{HierarchyViolationDetected, ValidationCompleted};
use crate::observability::messages::StructuredLog;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    HorizontalReference,
    BackwardReference,
    UnregisteredDependency,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::HorizontalReference => "HorizontalReference",
            ViolationKind::BackwardReference => "BackwardReference",
            ViolationKind::UnregisteredDependency => "UnregisteredDependency",
        }
    }
}

/// One forbidden input reference.
///
/// For `UnregisteredDependency` the `input_layer` is the layer encoded in the
/// input's identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyViolation {
    pub node_id: Identifier,
    pub input_id: Identifier,
    pub node_layer: u32,
    pub input_layer: u32,
    pub kind: ViolationKind,
}

impl fmt::Display for HierarchyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ViolationKind::UnregisteredDependency => write!(
                f,
                "{}: node '{}' depends on '{}' which is neither a registered node nor a raw input",
                self.kind.as_str(),
                self.node_id,
                self.input_id
            ),
            _ => write!(
                f,
                "{}: node '{}' (layer {}) depends on '{}' (layer {})",
                self.kind.as_str(),
                self.node_id,
                self.node_layer,
                self.input_id,
                self.input_layer
            ),
        }
    }
}

/// Outcome of a validation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub violations: Vec<HierarchyViolation>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn count(&self, kind: ViolationKind) -> usize {
        self.violations.iter().filter(|v| v.kind == kind).count()
    }
}

/// Validates the layering rule for every input of every node.
///
/// Nodes are visited in identifier order and inputs in declaration order, so
/// the report is deterministic.
pub fn validate_hierarchy(registry: &NodeRegistry) -> ValidationReport {
    let mut violations = Vec::new();

    for node in registry.all_nodes() {
        for input in &node.inputs {
            if registry.is_raw_input(input) {
                continue;
            }

            let kind = match registry.get(input) {
                Err(_) => Some(ViolationKind::UnregisteredDependency),
                Ok(dep) if dep.layer == node.layer => Some(ViolationKind::HorizontalReference),
                Ok(dep) if dep.layer > node.layer => Some(ViolationKind::BackwardReference),
                Ok(_) => None,
            };

            if let Some(kind) = kind {
                let violation = HierarchyViolation {
                    node_id: node.id,
                    input_id: *input,
                    node_layer: node.layer,
                    input_layer: input.layer(),
                    kind,
                };
                HierarchyViolationDetected {
                    violation: &violation,
                }
                .log();
                violations.push(violation);
            }
        }
    }

    ValidationCompleted {
        node_count: registry.len(),
        violation_count: violations.len(),
    }
    .log();

    ValidationReport { violations }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NodeDefinition;
    use crate::functions::{Combinator, FunctionKind};

    fn id(s: &str) -> Identifier {
        s.parse().unwrap()
    }

    fn node(s: &str, inputs: &[&str]) -> NodeDefinition {
        NodeDefinition::new(
            id(s),
            FunctionKind::Combinator(Combinator::Sum {
                arity: inputs.len(),
            }),
        )
        .with_inputs(inputs.iter().map(|i| id(i)).collect())
    }

    fn registry(nodes: Vec<NodeDefinition>) -> NodeRegistry {
        let mut registry = NodeRegistry::new();
        for n in nodes {
            registry.register(n).unwrap();
        }
        registry
    }

    #[test]
    fn test_valid_empty_registry() {
        assert!(validate_hierarchy(&NodeRegistry::new()).is_ok());
    }

    #[test]
    fn test_valid_strictly_decreasing_layers() {
        let registry = registry(vec![
            node("110^0-000", &[]),
            node("110^1-000", &["110^0-000"]),
            node("110^1-001", &["110^0-000"]),
            node("110^3-000", &["110^1-000", "110^1-001", "110^0-000"]),
        ]);
        assert!(validate_hierarchy(&registry).is_ok());
    }

    #[test]
    fn test_horizontal_reference() {
        let registry = registry(vec![
            node("110^1-000", &[]),
            node("110^1-001", &["110^1-000"]),
        ]);
        let report = validate_hierarchy(&registry);
        assert_eq!(
            report.violations,
            vec![HierarchyViolation {
                node_id: id("110^1-001"),
                input_id: id("110^1-000"),
                node_layer: 1,
                input_layer: 1,
                kind: ViolationKind::HorizontalReference,
            }]
        );
    }

    #[test]
    fn test_self_reference_is_horizontal() {
        let registry = registry(vec![node("110^1-000", &["110^1-000"])]);
        let report = validate_hierarchy(&registry);
        assert_eq!(report.count(ViolationKind::HorizontalReference), 1);
    }

    #[test]
    fn test_backward_reference() {
        let registry = registry(vec![
            node("110^2-000", &[]),
            node("110^1-000", &["110^2-000"]),
        ]);
        let report = validate_hierarchy(&registry);
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].kind, ViolationKind::BackwardReference);
        assert_eq!(report.violations[0].input_layer, 2);
    }

    #[test]
    fn test_unregistered_dependency() {
        let registry = registry(vec![node("110^1-000", &["110^0-042"])]);
        let report = validate_hierarchy(&registry);
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].kind, ViolationKind::UnregisteredDependency);
        assert!(report.violations[0]
            .to_string()
            .contains("neither a registered node nor a raw input"));
    }

    #[test]
    fn test_raw_sources_are_always_valid() {
        let mut registry = registry(vec![node("110^0-000", &["110^0-900"])]);
        registry.declare_raw_input(id("110^0-900")).unwrap();
        assert!(validate_hierarchy(&registry).is_ok());
    }

    #[test]
    fn test_reports_all_violations() {
        let registry = registry(vec![
            node("110^1-000", &[]),
            node("110^1-001", &["110^1-000", "110^2-000", "110^0-404"]),
            node("110^2-000", &["110^2-000"]),
        ]);
        let report = validate_hierarchy(&registry);
        assert_eq!(report.violations.len(), 4);
        assert_eq!(report.count(ViolationKind::HorizontalReference), 2);
        assert_eq!(report.count(ViolationKind::BackwardReference), 1);
        assert_eq!(report.count(ViolationKind::UnregisteredDependency), 1);

        // node order, then declaration order
        let kinds: Vec<ViolationKind> = report.violations.iter().map(|v| v.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ViolationKind::HorizontalReference,
                ViolationKind::BackwardReference,
                ViolationKind::UnregisteredDependency,
                ViolationKind::HorizontalReference,
            ]
        );
        assert!(!report.is_ok());
    }
}
