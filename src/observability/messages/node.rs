// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for per-node execution events.
//!
//! These fire inside an evaluation pass. None of them is fatal: a failing node
//! falls back to its declared default and the pass continues.

use crate::identifier::Identifier;
use crate::value::{Value, ValueType};
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// A node function returned an error or panicked.
///
/// # Log Level
/// `warn!` - Degraded result, pass continues
pub struct NodeExecutionFailed<'a> {
    pub node_id: &'a Identifier,
    pub function: &'a str,
    pub cause: &'a str,
}

impl Display for NodeExecutionFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' ({}) failed, using declared default: {}",
            self.node_id, self.function, self.cause
        )
    }
}

impl StructuredLog for NodeExecutionFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            event = "NodeExecutionFailed",
            node_id = %self.node_id,
            function = self.function,
            cause = self.cause,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "node_execution_failed",
            span_name = name,
            node_id = %self.node_id,
            function = self.function,
        )
    }
}

/// A result does not match a type the node declares for its outputs.
///
/// # Log Level
/// `warn!` - Result is kept, downstream typing may be off
pub struct OutputTypeMismatch<'a> {
    pub node_id: &'a Identifier,
    pub output: &'a str,
    pub expected: ValueType,
    pub actual: &'a Value,
}

impl Display for OutputTypeMismatch<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' output '{}' declared {} but produced {} {}",
            self.node_id,
            self.output,
            self.expected.as_str(),
            self.actual.type_name(),
            self.actual
        )
    }
}

impl StructuredLog for OutputTypeMismatch<'_> {
    fn log(&self) {
        tracing::warn!(
            event = "OutputTypeMismatch",
            node_id = %self.node_id,
            output = self.output,
            expected = self.expected.as_str(),
            actual = self.actual.type_name(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "output_type_mismatch",
            span_name = name,
            node_id = %self.node_id,
            output = self.output,
        )
    }
}

/// An input could not be resolved from raw inputs or earlier results.
///
/// # Log Level
/// `warn!` - Degraded result, pass continues
///
/// # Example
/// ```
/// use pkg_dag::observability::messages::node::MissingInput;
///
/// let node = "110^1-000".parse().unwrap();
/// let input = "110^0-000".parse().unwrap();
/// let msg = MissingInput { node_id: &node, input_id: &input };
/// assert!(msg.to_string().contains("110^0-000"));
/// ```
pub struct MissingInput<'a> {
    pub node_id: &'a Identifier,
    pub input_id: &'a Identifier,
}

impl Display for MissingInput<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' input '{}' missing, substituting declared default",
            self.node_id, self.input_id
        )
    }
}

impl StructuredLog for MissingInput<'_> {
    fn log(&self) {
        tracing::warn!(
            event = "MissingInput",
            node_id = %self.node_id,
            input_id = %self.input_id,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "missing_input",
            span_name = name,
            node_id = %self.node_id,
            input_id = %self.input_id,
        )
    }
}

/// A node finished executing.
///
/// # Log Level
/// `trace!` - Fires once per node per pass
pub struct NodeExecuted<'a> {
    pub node_id: &'a Identifier,
    pub function: &'a str,
    pub succeeded: bool,
    pub duration: Duration,
}

impl Display for NodeExecuted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' ({}) executed in {:?}, succeeded={}",
            self.node_id, self.function, self.duration, self.succeeded
        )
    }
}

impl StructuredLog for NodeExecuted<'_> {
    fn log(&self) {
        tracing::trace!(
            node_id = %self.node_id,
            function = self.function,
            succeeded = self.succeeded,
            duration_us = self.duration.as_micros() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::trace_span!(
            "node_executed",
            span_name = name,
            node_id = %self.node_id,
            function = self.function,
        )
    }
}
