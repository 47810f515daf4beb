// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for compilation, evaluation passes and registry reloads.
//!
//! This module contains message types for logging events related to:
//! * Execution-order compilation and cycle detection
//! * Evaluation pass lifecycle and the latency budget
//! * Hot reload of the active registry

use crate::errors::ReloadError;
use crate::identifier::Identifier;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// An execution order was compiled.
///
/// # Log Level
/// `debug!` - Happens once per registry generation
pub struct OrderCompiled {
    pub generation: u64,
    pub node_count: usize,
    pub edge_count: usize,
    pub level_count: usize,
}

impl Display for OrderCompiled {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Compiled execution order for generation {}: {} nodes, {} edges across {} layers",
            self.generation, self.node_count, self.edge_count, self.level_count
        )
    }
}

impl StructuredLog for OrderCompiled {
    fn log(&self) {
        tracing::debug!(
            generation = self.generation,
            node_count = self.node_count,
            edge_count = self.edge_count,
            level_count = self.level_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "compile",
            span_name = name,
            generation = self.generation,
            node_count = self.node_count,
        )
    }
}

/// Kahn's algorithm left nodes unplaced.
///
/// # Log Level
/// `error!` - Configuration defect
pub struct CyclicDependencyDetected<'a> {
    pub remaining_nodes: &'a [Identifier],
}

impl Display for CyclicDependencyDetected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let ids: Vec<String> = self.remaining_nodes.iter().map(|id| id.to_string()).collect();
        write!(
            f,
            "Cyclic dependency detected among {} nodes: {}",
            self.remaining_nodes.len(),
            ids.join(", ")
        )
    }
}

impl StructuredLog for CyclicDependencyDetected<'_> {
    fn log(&self) {
        tracing::error!(remaining_count = self.remaining_nodes.len(), "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "cyclic_dependency",
            span_name = name,
            remaining_count = self.remaining_nodes.len(),
        )
    }
}

/// An evaluation pass started.
///
/// # Log Level
/// `debug!` - Fires once per incoming sample
///
/// # Example
/// ```
/// use pkg_dag::observability::messages::engine::EvaluationStarted;
///
/// let msg = EvaluationStarted {
///     node_count: 12,
///     raw_input_count: 3,
/// };
///
/// assert_eq!(msg.to_string(), "Starting evaluation pass: 12 nodes, 3 raw inputs");
/// ```
pub struct EvaluationStarted {
    pub node_count: usize,
    pub raw_input_count: usize,
}

impl Display for EvaluationStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting evaluation pass: {} nodes, {} raw inputs",
            self.node_count, self.raw_input_count
        )
    }
}

impl StructuredLog for EvaluationStarted {
    fn log(&self) {
        tracing::debug!(
            node_count = self.node_count,
            raw_input_count = self.raw_input_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "evaluation",
            span_name = name,
            node_count = self.node_count,
            raw_input_count = self.raw_input_count,
        )
    }
}

/// An evaluation pass finished.
///
/// # Log Level
/// `debug!` - Fires once per incoming sample
pub struct EvaluationCompleted {
    pub node_count: usize,
    pub failed_count: usize,
    pub warning_count: usize,
    pub duration: Duration,
}

impl Display for EvaluationCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Evaluation pass completed in {:?}: {} nodes, {} failed, {} warnings",
            self.duration, self.node_count, self.failed_count, self.warning_count
        )
    }
}

impl StructuredLog for EvaluationCompleted {
    fn log(&self) {
        tracing::debug!(
            node_count = self.node_count,
            failed_count = self.failed_count,
            warning_count = self.warning_count,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "evaluation_completed",
            span_name = name,
            node_count = self.node_count,
            failed_count = self.failed_count,
        )
    }
}

/// A pass took longer than its latency budget. Advisory only.
///
/// # Log Level
/// `warn!` - Latency problem, results are still valid
///
/// # Example
/// ```
/// use pkg_dag::observability::messages::engine::BudgetExceeded;
/// use std::time::Duration;
///
/// let msg = BudgetExceeded {
///     elapsed: Duration::from_millis(42),
///     budget: Duration::from_millis(30),
/// };
///
/// assert!(msg.to_string().contains("30ms"));
/// ```
pub struct BudgetExceeded {
    pub elapsed: Duration,
    pub budget: Duration,
}

impl Display for BudgetExceeded {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Evaluation pass took {:?}, exceeding budget of {:?}",
            self.elapsed, self.budget
        )
    }
}

impl StructuredLog for BudgetExceeded {
    fn log(&self) {
        tracing::warn!(
            event = "BudgetExceeded",
            elapsed_us = self.elapsed.as_micros() as u64,
            budget_us = self.budget.as_micros() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "budget_exceeded",
            span_name = name,
            elapsed_us = self.elapsed.as_micros() as u64,
        )
    }
}

/// The pass memo returned the previous pass's results.
///
/// # Log Level
/// `trace!` - Fires once per sample when reuse is enabled
pub struct PassReused {
    pub generation: u64,
    pub node_count: usize,
}

impl Display for PassReused {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Raw inputs unchanged for generation {}; reusing {} node results",
            self.generation, self.node_count
        )
    }
}

impl StructuredLog for PassReused {
    fn log(&self) {
        tracing::trace!(
            generation = self.generation,
            node_count = self.node_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::trace_span!("pass_reused", span_name = name, generation = self.generation)
    }
}

/// A new registry and execution order were installed.
///
/// # Log Level
/// `info!` - Important operational event
pub struct RegistryReloaded<'a> {
    pub graph: &'a str,
    pub previous_generation: u64,
    pub generation: u64,
    pub node_count: usize,
}

impl Display for RegistryReloaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Graph '{}' reloaded: generation {} -> {}, {} nodes",
            self.graph, self.previous_generation, self.generation, self.node_count
        )
    }
}

impl StructuredLog for RegistryReloaded<'_> {
    fn log(&self) {
        tracing::info!(
            graph = self.graph,
            previous_generation = self.previous_generation,
            generation = self.generation,
            node_count = self.node_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "registry_reload",
            span_name = name,
            graph = self.graph,
            generation = self.generation,
        )
    }
}

/// A reload was rejected; the previous registry remains active.
///
/// # Log Level
/// `error!` - Configuration defect
pub struct ReloadRejected<'a> {
    pub graph: &'a str,
    pub active_generation: u64,
    pub error: &'a ReloadError,
}

impl Display for ReloadRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Graph '{}' keeps generation {}: {}",
            self.graph, self.active_generation, self.error
        )
    }
}

impl StructuredLog for ReloadRejected<'_> {
    fn log(&self) {
        tracing::error!(
            graph = self.graph,
            active_generation = self.active_generation,
            registration_errors = self.error.registration.len(),
            violations = self.error.violations.len(),
            cyclic = self.error.cycle.is_some(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "reload_rejected",
            span_name = name,
            graph = self.graph,
            active_generation = self.active_generation,
        )
    }
}
