// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for human-readable output and
//! [`StructuredLog`] to emit itself through `tracing` at the level its
//! documentation names.
//!
//! # Usage Pattern
//!
//! ```rust
//! use pkg_dag::observability::messages::engine::EvaluationStarted;
//! use pkg_dag::observability::messages::StructuredLog;
//!
//! let msg = EvaluationStarted {
//!     node_count: 12,
//!     raw_input_count: 3,
//! };
//!
//! msg.log();
//! ```

pub mod aggregation;
pub mod engine;
pub mod node;
pub mod validation;

use tracing::Span;

/// A message that knows its own log level and structured fields.
pub trait StructuredLog {
    /// Emit the message as a `tracing` event.
    fn log(&self);

    /// Open a span carrying the same fields.
    fn span(&self, name: &str) -> Span;
}
