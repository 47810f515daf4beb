// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The node registry: source of truth for the graph.
//!
//! Every successful mutation stamps the registry with a fresh generation
//! number. Compiled execution orders remember the generation they were built
//! from, so an order can never be evaluated against a registry it was not
//! compiled for.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::{DependencyGraph, NodeDefinition, RawSources};
use crate::errors::RegistryError;
use crate::identifier::Identifier;

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

fn next_generation() -> u64 {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone)]
pub struct NodeRegistry {
    nodes: BTreeMap<Identifier, NodeDefinition>,
    raw_sources: RawSources,
    generation: u64,
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
            raw_sources: RawSources::new(),
            generation: next_generation(),
        }
    }

    /// Builds a registry from a full set of definitions, collecting every
    /// registration error instead of stopping at the first.
    pub fn from_definitions(
        definitions: Vec<NodeDefinition>,
        raw_sources: RawSources,
    ) -> Result<Self, Vec<RegistryError>> {
        let mut registry = Self::new();
        let mut errors = Vec::new();

        for id in raw_sources.iter() {
            if let Err(e) = registry.declare_raw_input(*id) {
                errors.push(e);
            }
        }
        for definition in definitions {
            if let Err(e) = registry.register(definition) {
                errors.push(e);
            }
        }

        if errors.is_empty() {
            Ok(registry)
        } else {
            Err(errors)
        }
    }

    /// Registers a node definition.
    ///
    /// # Errors
    /// * `InvalidIdentifierFormat` - the id fails codec validation
    /// * `LayerFieldMismatch` - `layer` disagrees with the layer in the id
    /// * `DuplicateIdentifier` - a node or raw source already uses the id
    pub fn register(&mut self, definition: NodeDefinition) -> Result<(), RegistryError> {
        let id = definition.id;
        id.validate()
            .map_err(|source| RegistryError::InvalidIdentifierFormat {
                raw: id.to_string(),
                source,
            })?;
        if definition.layer != id.layer() {
            return Err(RegistryError::LayerFieldMismatch {
                id,
                declared: definition.layer,
                encoded: id.layer(),
            });
        }
        if self.nodes.contains_key(&id) || self.raw_sources.contains(&id) {
            return Err(RegistryError::DuplicateIdentifier { id });
        }

        self.nodes.insert(id, definition);
        self.generation = next_generation();
        Ok(())
    }

    /// Declares an identifier as an external raw input source.
    pub fn declare_raw_input(&mut self, id: Identifier) -> Result<(), RegistryError> {
        if self.nodes.contains_key(&id) || !self.raw_sources.add(id) {
            return Err(RegistryError::DuplicateIdentifier { id });
        }
        self.generation = next_generation();
        Ok(())
    }

    pub fn get(&self, id: &Identifier) -> Result<&NodeDefinition, RegistryError> {
        self.nodes
            .get(id)
            .ok_or(RegistryError::NotFound { id: *id })
    }

    pub fn contains(&self, id: &Identifier) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn is_raw_input(&self, id: &Identifier) -> bool {
        self.raw_sources.contains(id)
    }

    pub fn raw_sources(&self) -> &RawSources {
        &self.raw_sources
    }

    pub fn all_nodes(&self) -> impl Iterator<Item = &NodeDefinition> {
        self.nodes.values()
    }

    /// Nodes of one layer, sorted by identifier string.
    pub fn by_layer(&self, layer: u32) -> Vec<&NodeDefinition> {
        let mut nodes: Vec<&NodeDefinition> =
            self.nodes.values().filter(|n| n.layer == layer).collect();
        nodes.sort_by_key(|n| n.id.encode());
        nodes
    }

    /// Node count per layer.
    pub fn layers(&self) -> BTreeMap<u32, usize> {
        let mut layers = BTreeMap::new();
        for node in self.nodes.values() {
            *layers.entry(node.layer).or_insert(0) += 1;
        }
        layers
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Derived adjacency between registered nodes.
    pub fn dependency_graph(&self) -> DependencyGraph {
        DependencyGraph::from_registry(self)
    }
}
