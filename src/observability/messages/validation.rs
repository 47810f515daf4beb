// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for hierarchy validation.

use crate::config::HierarchyViolation;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A node references an input on the same or a higher layer, or an unknown id.
///
/// # Log Level
/// `error!` - Configuration defect
pub struct HierarchyViolationDetected<'a> {
    pub violation: &'a HierarchyViolation,
}

impl Display for HierarchyViolationDetected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Hierarchy violation: {}", self.violation)
    }
}

impl StructuredLog for HierarchyViolationDetected<'_> {
    fn log(&self) {
        tracing::error!(
            kind = self.violation.kind.as_str(),
            node_id = %self.violation.node_id,
            input_id = %self.violation.input_id,
            node_layer = self.violation.node_layer,
            input_layer = self.violation.input_layer,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "hierarchy_violation",
            span_name = name,
            kind = self.violation.kind.as_str(),
            node_id = %self.violation.node_id,
            input_id = %self.violation.input_id,
        )
    }
}

/// Validation run finished.
///
/// # Log Level
/// `debug!` when clean, `warn!` when violations were found
///
/// # Example
/// ```
/// use pkg_dag::observability::messages::validation::ValidationCompleted;
///
/// let msg = ValidationCompleted {
///     node_count: 8,
///     violation_count: 0,
/// };
///
/// assert_eq!(msg.to_string(), "Hierarchy validation checked 8 nodes: 0 violations");
/// ```
pub struct ValidationCompleted {
    pub node_count: usize,
    pub violation_count: usize,
}

impl Display for ValidationCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Hierarchy validation checked {} nodes: {} violations",
            self.node_count, self.violation_count
        )
    }
}

impl StructuredLog for ValidationCompleted {
    fn log(&self) {
        if self.violation_count == 0 {
            tracing::debug!(
                node_count = self.node_count,
                violation_count = self.violation_count,
                "{}", self
            );
        } else {
            tracing::warn!(
                node_count = self.node_count,
                violation_count = self.violation_count,
                "{}", self
            );
        }
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "validation",
            span_name = name,
            node_count = self.node_count,
            violation_count = self.violation_count,
        )
    }
}
