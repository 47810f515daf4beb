// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Single-pass evaluation of a compiled order.
//!
//! The engine walks the order once, resolving each node's inputs from the raw
//! inputs and from results already computed in the pass. Node problems never
//! abort a pass:
//!
//! * a missing input is replaced by the node's declared default and the node
//!   still runs (`succeeded = true`, `error_kind = MissingInput`)
//! * a function error or panic yields the declared default with
//!   `succeeded = false`
//!
//! A successful result that no declared output type accepts is kept and
//! recorded as an [`EngineWarning::OutputTypeMismatch`].
//!
//! Only structural problems (a stale order, an order naming an unknown node)
//! are returned as [`ExecutionError`].

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::config::consts::DEFAULT_BUDGET_MS;
use crate::config::{EngineOptions, NodeDefinition, NodeRegistry};
use crate::engine::{CachePolicy, CompiledOrder, ExecutionContext, PassMemo, RawInputs};
use crate::errors::ExecutionError;
use crate::identifier::Identifier;
use crate::observability::messages::engine::{
    BudgetExceeded, EvaluationCompleted, EvaluationStarted, PassReused,
};
use crate::observability::messages::node::{
    MissingInput, NodeExecuted, NodeExecutionFailed, OutputTypeMismatch,
};
use crate::observability::messages::StructuredLog;
use crate::value::{Value, ValueType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeErrorKind {
    /// At least one input was substituted with the declared default.
    MissingInput,
    /// The function returned an error.
    ExecutionFailed,
    /// The function panicked.
    Panicked,
}

/// Outcome of one node in one pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeResult {
    pub value: Value,
    pub succeeded: bool,
    pub error_kind: Option<NodeErrorKind>,
}

impl NodeResult {
    pub fn success(value: Value) -> Self {
        Self {
            value,
            succeeded: true,
            error_kind: None,
        }
    }

    pub fn degraded(value: Value) -> Self {
        Self {
            value,
            succeeded: true,
            error_kind: Some(NodeErrorKind::MissingInput),
        }
    }

    pub fn failed(default_value: Value, kind: NodeErrorKind) -> Self {
        Self {
            value: default_value,
            succeeded: false,
            error_kind: Some(kind),
        }
    }
}

/// Non-fatal events recorded during a pass, in the order they occurred.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineWarning {
    MissingInput {
        node_id: Identifier,
        input_id: Identifier,
    },
    NodeExecutionFailed {
        node_id: Identifier,
        kind: NodeErrorKind,
        cause: String,
    },
    OutputTypeMismatch {
        node_id: Identifier,
        output: String,
        expected: ValueType,
        actual: Value,
    },
    BudgetExceeded {
        elapsed: Duration,
        budget: Duration,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvaluationMetrics {
    pub node_timings: BTreeMap<Identifier, Duration>,
    pub total: Duration,
    pub budget: Duration,
    pub budget_exceeded: bool,
    pub warnings: Vec<EngineWarning>,
}

/// Results and metrics of one pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Evaluation {
    pub results: BTreeMap<Identifier, NodeResult>,
    pub metrics: EvaluationMetrics,
}

impl Evaluation {
    pub fn result(&self, id: &Identifier) -> Option<&NodeResult> {
        self.results.get(id)
    }

    pub fn value(&self, id: &Identifier) -> Option<&Value> {
        self.results.get(id).map(|r| &r.value)
    }

    pub fn failed_count(&self) -> usize {
        self.results.values().filter(|r| !r.succeeded).count()
    }

    /// Result values only, for callers that do not care about metrics.
    pub fn values(&self) -> BTreeMap<Identifier, Value> {
        self.results
            .iter()
            .map(|(id, r)| (*id, r.value.clone()))
            .collect()
    }
}

/// Evaluates compiled orders against a registry.
///
/// The engine itself holds no per-pass state and may be shared across
/// threads; every call builds its own [`ExecutionContext`].
#[derive(Debug, Clone)]
pub struct ExecutionEngine {
    budget: Duration,
    cache_policy: CachePolicy,
}

impl Default for ExecutionEngine {
    fn default() -> Self {
        Self {
            budget: Duration::from_millis(DEFAULT_BUDGET_MS),
            cache_policy: CachePolicy::default(),
        }
    }
}

impl ExecutionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_options(options: &EngineOptions) -> Self {
        Self {
            budget: options.budget(),
            cache_policy: options.cache_policy,
        }
    }

    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_cache_policy(mut self, cache_policy: CachePolicy) -> Self {
        self.cache_policy = cache_policy;
        self
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    pub fn cache_policy(&self) -> CachePolicy {
        self.cache_policy
    }

    /// Runs one pass over `order`.
    ///
    /// # Errors
    /// * `StaleExecutionOrder` - `order` was compiled for another generation
    /// * `NodeNotFound` - `order` names a node the registry does not hold
    pub fn evaluate(
        &self,
        registry: &NodeRegistry,
        order: &CompiledOrder,
        raw_inputs: &RawInputs,
    ) -> Result<Evaluation, ExecutionError> {
        check_generation(registry, order)?;

        let started = Instant::now();
        let start_msg = EvaluationStarted {
            node_count: order.len(),
            raw_input_count: raw_inputs.len(),
        };
        start_msg.log();
        let _pass = start_msg.span("evaluation").entered();

        let mut ctx = ExecutionContext::new(raw_inputs);
        let mut metrics = EvaluationMetrics {
            budget: self.budget,
            ..Default::default()
        };

        for id in order.iter() {
            let node = registry
                .get(id)
                .map_err(|_| ExecutionError::NodeNotFound(*id))?;
            let node_started = Instant::now();
            let result = execute_node(node, &ctx, &mut metrics.warnings);
            let elapsed = node_started.elapsed();
            if result.succeeded {
                check_outputs(node, &result.value, &mut metrics.warnings);
            }

            NodeExecuted {
                node_id: id,
                function: node.function.name(),
                succeeded: result.succeeded,
                duration: elapsed,
            }
            .log();
            metrics.node_timings.insert(*id, elapsed);
            ctx.record(*id, result);
        }

        metrics.total = started.elapsed();
        if metrics.total > self.budget {
            BudgetExceeded {
                elapsed: metrics.total,
                budget: self.budget,
            }
            .log();
            metrics.budget_exceeded = true;
            metrics.warnings.push(EngineWarning::BudgetExceeded {
                elapsed: metrics.total,
                budget: self.budget,
            });
        }

        let evaluation = Evaluation {
            results: ctx.into_results(),
            metrics,
        };
        EvaluationCompleted {
            node_count: evaluation.results.len(),
            failed_count: evaluation.failed_count(),
            warning_count: evaluation.metrics.warnings.len(),
            duration: evaluation.metrics.total,
        }
        .log();

        Ok(evaluation)
    }

    /// Like [`evaluate`](Self::evaluate), but under
    /// [`CachePolicy::ReuseIdenticalInputs`] returns the memoized pass when
    /// the generation and raw inputs are unchanged. Under
    /// [`CachePolicy::PerPass`] the memo is left untouched.
    pub fn evaluate_with_memo(
        &self,
        registry: &NodeRegistry,
        order: &CompiledOrder,
        raw_inputs: &RawInputs,
        memo: &mut PassMemo,
    ) -> Result<Evaluation, ExecutionError> {
        if self.cache_policy == CachePolicy::PerPass {
            return self.evaluate(registry, order, raw_inputs);
        }

        check_generation(registry, order)?;
        if let Some(previous) = memo.lookup(registry.generation(), raw_inputs) {
            PassReused {
                generation: registry.generation(),
                node_count: previous.results.len(),
            }
            .log();
            return Ok(previous.clone());
        }

        let evaluation = self.evaluate(registry, order, raw_inputs)?;
        memo.store(registry.generation(), raw_inputs.clone(), evaluation.clone());
        Ok(evaluation)
    }
}

/// Runs one pass with the default engine settings.
pub fn evaluate(
    registry: &NodeRegistry,
    order: &CompiledOrder,
    raw_inputs: &RawInputs,
) -> Result<Evaluation, ExecutionError> {
    ExecutionEngine::default().evaluate(registry, order, raw_inputs)
}

fn check_generation(registry: &NodeRegistry, order: &CompiledOrder) -> Result<(), ExecutionError> {
    if order.generation() != registry.generation() {
        return Err(ExecutionError::StaleExecutionOrder {
            order_generation: order.generation(),
            registry_generation: registry.generation(),
        });
    }
    Ok(())
}

fn execute_node(
    node: &NodeDefinition,
    ctx: &ExecutionContext<'_>,
    warnings: &mut Vec<EngineWarning>,
) -> NodeResult {
    if node.is_raw_input() {
        return match ctx.raw_input(&node.id) {
            Some(value) => NodeResult::success(value.clone()),
            None => {
                report_missing(node, &node.id, warnings);
                NodeResult::degraded(node.default_value.clone())
            }
        };
    }

    let mut missing = false;
    let inputs: Vec<Value> = node
        .inputs
        .iter()
        .map(|input| {
            ctx.resolve(input).unwrap_or_else(|| {
                missing = true;
                report_missing(node, input, warnings);
                node.default_value.clone()
            })
        })
        .collect();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        node.function.invoke(&inputs, &node.parameters)
    }));

    let (kind, cause) = match outcome {
        Ok(Ok(value)) if missing => return NodeResult::degraded(value),
        Ok(Ok(value)) => return NodeResult::success(value),
        Ok(Err(e)) => (NodeErrorKind::ExecutionFailed, e.to_string()),
        Err(payload) => (NodeErrorKind::Panicked, panic_message(payload.as_ref())),
    };

    NodeExecutionFailed {
        node_id: &node.id,
        function: node.function.name(),
        cause: &cause,
    }
    .log();
    warnings.push(EngineWarning::NodeExecutionFailed {
        node_id: node.id,
        kind,
        cause,
    });
    NodeResult::failed(node.default_value.clone(), kind)
}

fn check_outputs(node: &NodeDefinition, value: &Value, warnings: &mut Vec<EngineWarning>) {
    for (output, expected) in node.outputs.iter().filter(|(_, t)| !t.accepts(value)) {
        OutputTypeMismatch {
            node_id: &node.id,
            output,
            expected: *expected,
            actual: value,
        }
        .log();
        warnings.push(EngineWarning::OutputTypeMismatch {
            node_id: node.id,
            output: output.clone(),
            expected: *expected,
            actual: value.clone(),
        });
    }
}

fn report_missing(node: &NodeDefinition, input: &Identifier, warnings: &mut Vec<EngineWarning>) {
    MissingInput {
        node_id: &node.id,
        input_id: input,
    }
    .log();
    warnings.push(EngineWarning::MissingInput {
        node_id: node.id,
        input_id: *input,
    });
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}
