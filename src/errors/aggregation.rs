// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use crate::errors::ExecutionError;
use crate::identifier::Identifier;

/// Errors raised by the multi-timeframe aggregator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AggregationError {
    /// No timeframe produced a usable signal.
    #[error("no timeframe produced a voting signal")]
    NoVotes,

    /// Weights must be finite and non-negative.
    #[error("timeframe {timeframe} has invalid weight {weight}")]
    InvalidWeight { timeframe: u8, weight: f64 },

    /// A source's signal identifier encodes a different timeframe.
    #[error("timeframe {timeframe} reads signal '{signal}' which belongs to timeframe {}", signal.timeframe())]
    SignalTimeframeMismatch { timeframe: u8, signal: Identifier },

    /// The same timeframe was configured twice.
    #[error("timeframe {0} configured more than once")]
    DuplicateTimeframe(u8),

    /// A timeframe's evaluation pass failed structurally.
    #[error("timeframe {timeframe} evaluation failed: {source}")]
    Evaluation {
        timeframe: u8,
        #[source]
        source: ExecutionError,
    },
}
