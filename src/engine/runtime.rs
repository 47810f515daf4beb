// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Hot-reloadable holder of the active registry and its compiled order.
//!
//! A pass clones the active `Arc` under a short read lock and then runs
//! without holding any lock, so a concurrent reload never blocks it and a
//! pass always sees one consistent registry/order pair.
//!
//! Under [`CachePolicy::ReuseIdenticalInputs`] the runtime keeps the memo of
//! its last pass. Such passes take the memo lock for their whole duration.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::config::{build_definitions, validate_hierarchy, GraphConfig, NodeDefinition, NodeRegistry, RawSources};
use crate::engine::{compile, CachePolicy, CompiledOrder, Evaluation, ExecutionEngine, PassMemo, RawInputs};
use crate::errors::{ConfigError, ExecutionError, ReloadError};
use crate::functions::FunctionCatalog;
use crate::observability::messages::engine::{RegistryReloaded, ReloadRejected};
use crate::observability::messages::StructuredLog;
use crate::traits::GraphEvaluator;

/// A registry together with the order compiled from it.
#[derive(Debug)]
pub struct ActiveGraph {
    registry: NodeRegistry,
    order: CompiledOrder,
}

impl ActiveGraph {
    /// Registers, validates and compiles `definitions`, reporting every problem found.
    pub fn build(definitions: Vec<NodeDefinition>, raw_sources: RawSources) -> Result<Self, ReloadError> {
        let registry = NodeRegistry::from_definitions(definitions, raw_sources).map_err(|registration| {
            ReloadError {
                registration,
                ..Default::default()
            }
        })?;

        let mut error = ReloadError {
            violations: validate_hierarchy(&registry).violations,
            ..Default::default()
        };
        match compile(&registry) {
            Ok(order) if error.is_empty() => return Ok(Self { registry, order }),
            Ok(_) => {}
            Err(cycle) => error.cycle = Some(cycle),
        }
        Err(error)
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    pub fn order(&self) -> &CompiledOrder {
        &self.order
    }

    pub fn generation(&self) -> u64 {
        self.registry.generation()
    }
}

/// Named graph with an engine configuration and an atomically swappable
/// [`ActiveGraph`].
#[derive(Debug)]
pub struct GraphRuntime {
    name: String,
    engine: ExecutionEngine,
    active: RwLock<Arc<ActiveGraph>>,
    memo: Mutex<PassMemo>,
}

impl GraphRuntime {
    pub fn new(
        name: impl Into<String>,
        engine: ExecutionEngine,
        definitions: Vec<NodeDefinition>,
        raw_sources: RawSources,
    ) -> Result<Self, ReloadError> {
        let active = ActiveGraph::build(definitions, raw_sources)?;
        Ok(Self {
            name: name.into(),
            engine,
            active: RwLock::new(Arc::new(active)),
            memo: Mutex::new(PassMemo::new()),
        })
    }

    /// Builds a runtime from a parsed graph document.
    ///
    /// # Errors
    /// * `InvalidRecords` - node records could not be resolved into definitions
    /// * `Rejected` - registration, validation or compilation failed
    pub fn from_config(config: &GraphConfig, catalog: &FunctionCatalog) -> Result<Self, ConfigError> {
        let (definitions, raw_sources) =
            build_definitions(config, catalog).map_err(|errors| ConfigError::InvalidRecords {
                graph: config.name.clone(),
                errors,
            })?;
        let engine = ExecutionEngine::from_options(&config.engine);
        Ok(Self::new(config.name.clone(), engine, definitions, raw_sources)?)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn engine(&self) -> &ExecutionEngine {
        &self.engine
    }

    /// Snapshot of the currently active graph.
    pub fn active(&self) -> Arc<ActiveGraph> {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn generation(&self) -> u64 {
        self.active().generation()
    }

    /// Replaces the active graph with one built from `definitions`.
    ///
    /// The swap happens only if registration, validation and compilation all
    /// succeed. Otherwise the previous graph stays active and every problem is
    /// returned. Returns the new generation on success.
    pub fn reload_registry(
        &self,
        definitions: Vec<NodeDefinition>,
        raw_sources: RawSources,
    ) -> Result<u64, ReloadError> {
        let previous_generation = self.generation();
        let next = match ActiveGraph::build(definitions, raw_sources) {
            Ok(next) => next,
            Err(error) => {
                ReloadRejected {
                    graph: &self.name,
                    active_generation: previous_generation,
                    error: &error,
                }
                .log();
                return Err(error);
            }
        };

        let generation = next.generation();
        let node_count = next.registry.len();
        *self.active.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(next);
        self.memo.lock().unwrap_or_else(PoisonError::into_inner).clear();

        RegistryReloaded {
            graph: &self.name,
            previous_generation,
            generation,
            node_count,
        }
        .log();
        Ok(generation)
    }

    /// Runs one pass against the active graph, honouring the engine's cache
    /// policy. A reload changes the generation, so a memoized pass is never
    /// returned for a graph it was not computed on.
    pub fn evaluate(&self, raw_inputs: &RawInputs) -> Result<Evaluation, ExecutionError> {
        let active = self.active();
        match self.engine.cache_policy() {
            CachePolicy::PerPass => self.engine.evaluate(&active.registry, &active.order, raw_inputs),
            CachePolicy::ReuseIdenticalInputs => {
                let mut memo = self.memo.lock().unwrap_or_else(PoisonError::into_inner);
                self.engine
                    .evaluate_with_memo(&active.registry, &active.order, raw_inputs, &mut memo)
            }
        }
    }

    /// Runs one pass with a caller-owned memo instead of the runtime's own.
    pub fn evaluate_with_memo(
        &self,
        raw_inputs: &RawInputs,
        memo: &mut PassMemo,
    ) -> Result<Evaluation, ExecutionError> {
        let active = self.active();
        self.engine
            .evaluate_with_memo(&active.registry, &active.order, raw_inputs, memo)
    }
}

impl GraphEvaluator for GraphRuntime {
    fn evaluate(&self, raw_inputs: &RawInputs) -> Result<Evaluation, ExecutionError> {
        GraphRuntime::evaluate(self, raw_inputs)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
