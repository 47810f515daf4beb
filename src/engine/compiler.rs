// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::config::NodeRegistry;
use crate::errors::CompileError;
use crate::identifier::Identifier;
use crate::observability::messages::engine::{CyclicDependencyDetected, OrderCompiled};
use crate::observability::messages::StructuredLog;

/// A topologically sorted execution plan bound to one registry generation.
///
/// Produced by [`compile`]. The engine refuses to run an order against a
/// registry whose generation differs from the one recorded here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledOrder {
    generation: u64,
    ids: Vec<Identifier>,
}

impl CompiledOrder {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn ids(&self) -> &[Identifier] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Identifier> {
        self.ids.iter()
    }

    /// The order grouped by layer, preserving order within each layer.
    pub fn levels(&self) -> BTreeMap<u32, Vec<Identifier>> {
        let mut levels: BTreeMap<u32, Vec<Identifier>> = BTreeMap::new();
        for id in &self.ids {
            levels.entry(id.layer()).or_default().push(*id);
        }
        levels
    }
}

/// Compiles the registry into an execution order using Kahn's algorithm.
///
/// The ready set is ordered by `(layer, identifier string)`, so the same
/// registry always yields the same order. Inputs that are raw sources or
/// unregistered do not count towards a node's in-degree; the validator
/// reports those separately.
///
/// # Errors
/// `CyclicDependency` with every node that could not be placed, sorted by the
/// same key as the ready set.
pub fn compile(registry: &NodeRegistry) -> Result<CompiledOrder, CompileError> {
    let graph = registry.dependency_graph();
    let mut in_degree = graph.in_degrees();

    let mut ready: BTreeSet<(u32, String, Identifier)> = in_degree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(id, _)| ready_key(id))
        .collect();

    let mut ids = Vec::with_capacity(graph.node_count());
    while let Some((_, _, id)) = ready.pop_first() {
        ids.push(id);
        for dependent in graph.dependents_of(&id) {
            if let Some(degree) = in_degree.get_mut(dependent) {
                *degree -= 1;
                if *degree == 0 {
                    ready.insert(ready_key(dependent));
                }
            }
        }
    }

    if ids.len() < graph.node_count() {
        let mut remaining: Vec<(u32, String, Identifier)> = in_degree
            .iter()
            .filter(|(_, degree)| **degree > 0)
            .map(|(id, _)| ready_key(id))
            .collect();
        remaining.sort();
        let remaining_nodes: Vec<Identifier> = remaining.into_iter().map(|(_, _, id)| id).collect();

        CyclicDependencyDetected {
            remaining_nodes: &remaining_nodes,
        }
        .log();
        return Err(CompileError::CyclicDependency { remaining_nodes });
    }

    let order = CompiledOrder {
        generation: registry.generation(),
        ids,
    };
    OrderCompiled {
        generation: order.generation,
        node_count: order.len(),
        edge_count: graph.edge_count(),
        level_count: order.levels().len(),
    }
    .log();

    Ok(order)
}

fn ready_key(id: &Identifier) -> (u32, String, Identifier) {
    let (layer, encoded) = id.order_key();
    (layer, encoded, *id)
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
        NodeRegistry::from_definitions(nodes, Default::default()).unwrap()
    }

    fn encoded(order: &CompiledOrder) -> Vec<String> {
        order.iter().map(Identifier::encode).collect()
    }

    #[test]
    fn test_empty_registry_compiles_to_empty_order() {
        let registry = NodeRegistry::new();
        let order = compile(&registry).unwrap();
        assert!(order.is_empty());
        assert_eq!(order.generation(), registry.generation());
    }

    #[test]
    fn test_ready_set_orders_by_layer_then_string() {
        let registry = registry(vec![
            node("310^1-000", &["210^0-000"]),
            node("210^0-000", &[]),
            node("110^0-001", &[]),
            node("110^0-000", &[]),
            node("110^2-000", &["310^1-000", "110^0-001"]),
        ]);
        let order = compile(&registry).unwrap();
        assert_eq!(
            encoded(&order),
            vec!["110^0-000", "110^0-001", "210^0-000", "310^1-000", "110^2-000"]
        );
    }

    #[test]
    fn test_layer_ten_sorts_after_layer_two() {
        let registry = registry(vec![
            node("110^10-000", &["110^2-000"]),
            node("110^2-000", &[]),
        ]);
        let order = compile(&registry).unwrap();
        assert_eq!(encoded(&order), vec!["110^2-000", "110^10-000"]);
    }

    #[test]
    fn test_dependencies_precede_dependents() {
        let registry = registry(vec![
            node("110^0-000", &[]),
            node("110^1-000", &["110^0-000"]),
            node("110^1-001", &["110^0-000"]),
            node("110^2-000", &["110^1-000", "110^1-001"]),
        ]);
        let order = compile(&registry).unwrap();
        let position = |s: &str| order.ids().iter().position(|i| *i == id(s)).unwrap();
        for def in registry.all_nodes() {
            for input in &def.inputs {
                assert!(position(&input.encode()) < position(&def.id.encode()));
            }
        }
    }

    #[test]
    fn test_raw_and_unregistered_inputs_do_not_block() {
        let mut registry = registry(vec![node("110^1-000", &["110^0-900", "110^0-404"])]);
        registry.declare_raw_input(id("110^0-900")).unwrap();
        let order = compile(&registry).unwrap();
        assert_eq!(encoded(&order), vec!["110^1-000"]);
    }

    #[test]
    fn test_cycle_is_rejected() {
        let registry = registry(vec![
            node("110^0-000", &[]),
            node("110^1-000", &["110^0-000", "110^1-001"]),
            node("110^1-001", &["110^1-000"]),
            node("110^2-000", &["110^1-001"]),
        ]);
        let err = compile(&registry).unwrap_err();
        assert_eq!(
            err,
            CompileError::CyclicDependency {
                remaining_nodes: vec![id("110^1-000"), id("110^1-001"), id("110^2-000")],
            }
        );
        assert!(err.to_string().contains("110^1-000, 110^1-001"));
    }

    #[test]
    fn test_levels_group_by_layer() {
        let registry = registry(vec![
            node("110^0-000", &[]),
            node("210^0-000", &[]),
            node("110^3-000", &["110^0-000", "210^0-000"]),
        ]);
        let levels = compile(&registry).unwrap().levels();
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[&0], vec![id("110^0-000"), id("210^0-000")]);
        assert_eq!(levels[&3], vec![id("110^3-000")]);
    }

    #[test]
    fn test_compile_is_deterministic() {
        let build = || {
            registry(vec![
                node("120^0-000", &[]),
                node("110^0-000", &[]),
                node("110^1-005", &["120^0-000"]),
                node("110^1-002", &["110^0-000"]),
            ])
        };
        assert_eq!(encoded(&compile(&build()).unwrap()), encoded(&compile(&build()).unwrap()));
    }
}
