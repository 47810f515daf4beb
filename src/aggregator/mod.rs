// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Weighted vote over the final signals of several timeframes.
//!
//! Each timeframe runs its own graph. The aggregator reads one signal node
//! from each timeframe's evaluation and lets the timeframes vote with their
//! configured weights:
//!
//! * failed, absent or zero-weight signals do not vote
//! * the value with the largest total weight wins, ties resolved by [`TieBreak`]
//! * confidence is the winning weight divided by the total voting weight
//! * the contributing timeframe is the heaviest voter for the winning value,
//!   the lowest timeframe code on equal weights

mod multi;

pub use multi::{MultiTimeframeEngine, MultiTimeframeOutcome};

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::config::StrategyConfig;
use crate::engine::Evaluation;
use crate::errors::{AggregationError, ConfigError};
use crate::identifier::Identifier;
use crate::observability::messages::aggregation::{SignalSkipped, VoteCompleted};
use crate::observability::messages::StructuredLog;
use crate::value::Value;

/// Final signal of one timeframe. Timeframe-specific data lives in
/// `extensions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub timeframe: u8,
    pub identifier: Identifier,
    pub value: Value,
    pub succeeded: bool,
    #[serde(default)]
    pub extensions: BTreeMap<String, Value>,
}

/// Where a timeframe's signal comes from and how much it counts.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeframeSource {
    pub timeframe: u8,
    pub weight: f64,
    pub signal: Identifier,
    pub extensions: BTreeMap<String, Value>,
}

impl TimeframeSource {
    pub fn new(timeframe: u8, weight: f64, signal: Identifier) -> Self {
        Self {
            timeframe,
            weight,
            signal,
            extensions: BTreeMap::new(),
        }
    }

    /// Reads this source's signal out of an evaluation. `None` when the
    /// signal node was not evaluated.
    pub fn signal_from(&self, evaluation: &Evaluation) -> Option<Signal> {
        evaluation.result(&self.signal).map(|result| Signal {
            timeframe: self.timeframe,
            identifier: self.signal,
            value: result.value.clone(),
            succeeded: result.succeeded,
            extensions: self.extensions.clone(),
        })
    }
}

/// How to choose between values with equal total weight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// The value backed by the single heaviest voter.
    #[default]
    HighestWeightVoter,
    /// The numerically largest value.
    HighestValue,
    /// The numerically smallest value.
    LowestValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vote {
    pub timeframe: u8,
    pub value: Value,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedSignal {
    pub dominant_value: Value,
    pub confidence: f64,
    pub contributing_timeframe: u8,
    /// Votes that counted, in timeframe order.
    pub votes: Vec<Vote>,
}

struct Tally {
    value: Value,
    weight: f64,
    leader_weight: f64,
    leader: u8,
}

#[derive(Debug, Clone)]
pub struct MultiTimeframeAggregator {
    strategy: String,
    tie_break: TieBreak,
    sources: Vec<TimeframeSource>,
}

impl MultiTimeframeAggregator {
    /// # Errors
    /// * `InvalidWeight` - a weight is negative or not finite
    /// * `SignalTimeframeMismatch` - a signal id encodes another timeframe
    /// * `DuplicateTimeframe` - two sources share a timeframe
    pub fn new(
        strategy: impl Into<String>,
        tie_break: TieBreak,
        mut sources: Vec<TimeframeSource>,
    ) -> Result<Self, AggregationError> {
        let mut seen = BTreeSet::new();
        for source in &sources {
            if !source.weight.is_finite() || source.weight < 0.0 {
                return Err(AggregationError::InvalidWeight {
                    timeframe: source.timeframe,
                    weight: source.weight,
                });
            }
            if source.signal.timeframe() != source.timeframe {
                return Err(AggregationError::SignalTimeframeMismatch {
                    timeframe: source.timeframe,
                    signal: source.signal,
                });
            }
            if !seen.insert(source.timeframe) {
                return Err(AggregationError::DuplicateTimeframe(source.timeframe));
            }
        }
        sources.sort_by_key(|s| s.timeframe);

        Ok(Self {
            strategy: strategy.into(),
            tie_break,
            sources,
        })
    }

    /// Builds the aggregator half of a strategy document.
    pub fn from_strategy(config: &StrategyConfig) -> Result<Self, ConfigError> {
        let mut sources = Vec::with_capacity(config.timeframes.len());
        for timeframe in &config.timeframes {
            let signal = timeframe
                .signal
                .parse()
                .map_err(|source| ConfigError::InvalidIdentifier {
                    raw: timeframe.signal.clone(),
                    context: "strategy signal",
                    source,
                })?;
            sources.push(TimeframeSource {
                timeframe: timeframe.timeframe,
                weight: timeframe.weight,
                signal,
                extensions: timeframe.extensions.clone(),
            });
        }
        Ok(Self::new(config.strategy.clone(), config.tie_break, sources)?)
    }

    pub fn strategy(&self) -> &str {
        &self.strategy
    }

    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    pub fn sources(&self) -> &[TimeframeSource] {
        &self.sources
    }

    /// Collects each configured timeframe's signal from its evaluation.
    pub fn signals(&self, evaluations: &BTreeMap<u8, Evaluation>) -> Vec<Signal> {
        self.sources
            .iter()
            .filter_map(|source| {
                let signal = evaluations
                    .get(&source.timeframe)
                    .and_then(|evaluation| source.signal_from(evaluation));
                if signal.is_none() {
                    SignalSkipped {
                        timeframe: source.timeframe,
                        reason: "signal not evaluated",
                    }
                    .log();
                }
                signal
            })
            .collect()
    }

    /// Votes over one evaluation per timeframe.
    pub fn aggregate(&self, evaluations: &BTreeMap<u8, Evaluation>) -> Result<AggregatedSignal, AggregationError> {
        self.vote(&self.signals(evaluations))
    }

    /// Votes over already collected signals. Signals from timeframes without
    /// a configured source are ignored.
    pub fn vote(&self, signals: &[Signal]) -> Result<AggregatedSignal, AggregationError> {
        let mut votes = Vec::new();
        for source in &self.sources {
            let Some(signal) = signals.iter().find(|s| s.timeframe == source.timeframe) else {
                continue;
            };
            let reason = if !signal.succeeded {
                Some("signal node failed")
            } else if source.weight == 0.0 {
                Some("zero weight")
            } else {
                None
            };
            match reason {
                Some(reason) => SignalSkipped {
                    timeframe: source.timeframe,
                    reason,
                }
                .log(),
                None => votes.push(Vote {
                    timeframe: source.timeframe,
                    value: signal.value.clone(),
                    weight: source.weight,
                }),
            }
        }

        let mut tallies: Vec<Tally> = Vec::new();
        for vote in &votes {
            match tallies.iter_mut().find(|t| same_vote(&t.value, &vote.value)) {
                Some(tally) => {
                    tally.weight += vote.weight;
                    // votes arrive in timeframe order, so only a strictly heavier voter takes over
                    if vote.weight > tally.leader_weight {
                        tally.leader_weight = vote.weight;
                        tally.leader = vote.timeframe;
                    }
                }
                None => tallies.push(Tally {
                    value: vote.value.clone(),
                    weight: vote.weight,
                    leader_weight: vote.weight,
                    leader: vote.timeframe,
                }),
            }
        }

        let total: f64 = votes.iter().map(|v| v.weight).sum();
        let winner = tallies
            .iter()
            .max_by(|a, b| self.compare(a, b))
            .ok_or(AggregationError::NoVotes)?;

        let aggregated = AggregatedSignal {
            dominant_value: winner.value.clone(),
            confidence: winner.weight / total,
            contributing_timeframe: winner.leader,
            votes,
        };
        VoteCompleted {
            strategy: &self.strategy,
            dominant_value: &aggregated.dominant_value,
            confidence: aggregated.confidence,
            contributing_timeframe: aggregated.contributing_timeframe,
            voter_count: aggregated.votes.len(),
        }
        .log();

        Ok(aggregated)
    }

    /// `Greater` means `a` beats `b`. The final fallback prefers the tally
    /// whose leader has the lower timeframe code.
    fn compare(&self, a: &Tally, b: &Tally) -> Ordering {
        let by_weight = a.weight.total_cmp(&b.weight);
        if by_weight != Ordering::Equal {
            return by_weight;
        }
        let by_rule = match self.tie_break {
            TieBreak::HighestWeightVoter => a.leader_weight.total_cmp(&b.leader_weight),
            TieBreak::HighestValue => numeric(&a.value, f64::NEG_INFINITY)
                .total_cmp(&numeric(&b.value, f64::NEG_INFINITY)),
            TieBreak::LowestValue => numeric(&b.value, f64::INFINITY)
                .total_cmp(&numeric(&a.value, f64::INFINITY)),
        };
        by_rule.then_with(|| b.leader.cmp(&a.leader))
    }
}

fn numeric(value: &Value, fallback: f64) -> f64 {
    value.as_f64().filter(|n| !n.is_nan()).unwrap_or(fallback)
}

/// `1` and `1.0` are the same vote.
fn same_vote(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Text(x), Value::Text(y)) => x == y,
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
    }
}
