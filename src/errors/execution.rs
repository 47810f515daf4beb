// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use crate::identifier::Identifier;

/// Errors raised by the execution-order compiler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// Kahn's algorithm could not place these nodes; they sit on or behind a cycle.
    #[error("cyclic dependency among nodes: {}", join_ids(.remaining_nodes))]
    CyclicDependency { remaining_nodes: Vec<Identifier> },
}

/// Structural errors that abort an evaluation pass.
///
/// Node level problems never surface here; they are recovered with the
/// node's declared default.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    /// The compiled order was produced for a different registry generation.
    #[error("execution order compiled for registry generation {order_generation} but registry is at generation {registry_generation}")]
    StaleExecutionOrder {
        order_generation: u64,
        registry_generation: u64,
    },

    /// The compiled order names a node the registry does not hold.
    #[error("node '{0}' in execution order is not registered")]
    NodeNotFound(Identifier),
}

/// Errors returned by node function bodies.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FunctionError {
    #[error("input {index} is not numeric: {found} {value}")]
    NonNumericInput {
        index: usize,
        found: &'static str,
        value: String,
    },

    #[error("{0}")]
    Failed(String),
}

fn join_ids(ids: &[Identifier]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
