// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging.
//!
//! This module provides centralized message types for every diagnostic and
//! operational event the engine emits. Message types follow a struct-based
//! pattern with a `Display` implementation and a [`messages::StructuredLog`]
//! implementation that picks the level and attaches structured fields:
//!
//! * No magic strings scattered through the engine
//! * One place to change wording
//! * Consistent, structured `tracing` output
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::engine` - compilation, evaluation passes, budget, reloads
//! * `messages::node` - per-node execution events
//! * `messages::validation` - hierarchy validation results
//! * `messages::aggregation` - multi-timeframe voting
//!
//! # Usage
//!
//! ```rust
//! use pkg_dag::observability::messages::node::NodeExecutionFailed;
//! use pkg_dag::observability::messages::StructuredLog;
//!
//! let id = "110^1-000".parse().unwrap();
//! NodeExecutionFailed {
//!     node_id: &id,
//!     function: "sign",
//!     cause: "input 0 is not numeric",
//! }
//! .log();
//! ```

pub mod messages;
