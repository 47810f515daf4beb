use std::collections::BTreeMap;

use crate::config::NodeRegistry;
use crate::identifier::Identifier;

/// Adjacency structure derived from the registry's declared inputs.
///
/// Only edges between registered nodes are kept; raw sources and unknown
/// inputs are not part of the graph. An input listed twice by a node yields
/// two parallel edges.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// node -> nodes that consume it
    dependents: BTreeMap<Identifier, Vec<Identifier>>,
    /// node -> registered nodes it consumes
    dependencies: BTreeMap<Identifier, Vec<Identifier>>,
}

impl DependencyGraph {
    pub fn from_registry(registry: &NodeRegistry) -> Self {
        let mut graph = Self::default();
        for node in registry.all_nodes() {
            graph.dependents.entry(node.id).or_default();
            graph.dependencies.entry(node.id).or_default();
        }
        for node in registry.all_nodes() {
            for input in node.inputs.iter().filter(|i| registry.contains(i)) {
                graph.dependents.entry(*input).or_default().push(node.id);
                graph.dependencies.entry(node.id).or_default().push(*input);
            }
        }
        graph
    }

    pub fn dependents_of(&self, id: &Identifier) -> &[Identifier] {
        self.dependents.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of incoming edges per node.
    pub fn in_degrees(&self) -> BTreeMap<Identifier, usize> {
        self.dependencies
            .iter()
            .map(|(id, deps)| (*id, deps.len()))
            .collect()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Identifier> {
        self.dependencies.keys()
    }

    pub fn node_count(&self) -> usize {
        self.dependencies.len()
    }

    pub fn edge_count(&self) -> usize {
        self.dependencies.values().map(Vec::len).sum()
    }
}
