// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the multi-timeframe vote.

use crate::observability::messages::StructuredLog;
use crate::value::Value;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A timeframe's signal did not take part in the vote.
///
/// # Log Level
/// `debug!` - Expected when a timeframe has not produced a signal yet
pub struct SignalSkipped<'a> {
    pub timeframe: u8,
    pub reason: &'a str,
}

impl Display for SignalSkipped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Timeframe {} does not vote: {}", self.timeframe, self.reason)
    }
}

impl StructuredLog for SignalSkipped<'_> {
    fn log(&self) {
        tracing::debug!(timeframe = self.timeframe, reason = self.reason, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("signal_skipped", span_name = name, timeframe = self.timeframe)
    }
}

/// Weighted vote finished.
///
/// # Log Level
/// `info!` - Final decision input for downstream trading code
///
/// # Example
/// ```
/// use pkg_dag::observability::messages::aggregation::VoteCompleted;
/// use pkg_dag::value::Value;
///
/// let msg = VoteCompleted {
///     strategy: "swing",
///     dominant_value: &Value::Integer(1),
///     confidence: 0.75,
///     contributing_timeframe: 2,
///     voter_count: 3,
/// };
///
/// assert!(msg.to_string().contains("confidence 0.75"));
/// ```
pub struct VoteCompleted<'a> {
    pub strategy: &'a str,
    pub dominant_value: &'a Value,
    pub confidence: f64,
    pub contributing_timeframe: u8,
    pub voter_count: usize,
}

impl Display for VoteCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Strategy '{}' voted {} with confidence {:.2} from {} voters (led by timeframe {})",
            self.strategy,
            self.dominant_value,
            self.confidence,
            self.voter_count,
            self.contributing_timeframe
        )
    }
}

impl StructuredLog for VoteCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            strategy = self.strategy,
            dominant_value = %self.dominant_value,
            confidence = self.confidence,
            contributing_timeframe = self.contributing_timeframe,
            voter_count = self.voter_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "vote",
            span_name = name,
            strategy = self.strategy,
            voter_count = self.voter_count,
        )
    }
}
