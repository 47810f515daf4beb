// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;
use std::sync::Arc;

use rayon::prelude::*;

use crate::aggregator::{AggregatedSignal, MultiTimeframeAggregator};
use crate::config::{load_graph_config, StrategyConfig};
use crate::engine::{Evaluation, GraphRuntime, RawInputs};
use crate::errors::{AggregationError, ConfigError};
use crate::functions::FunctionCatalog;
use crate::traits::GraphEvaluator;

/// Every timeframe's evaluation plus the vote over them.
#[derive(Debug, Clone)]
pub struct MultiTimeframeOutcome {
    pub evaluations: BTreeMap<u8, Evaluation>,
    pub signal: AggregatedSignal,
}

/// Runs one graph per timeframe in parallel and aggregates their signals.
///
/// Passes are independent: each timeframe evaluates on its own
/// [`GraphEvaluator`] with its own context, and all of them receive the same
/// raw input map. Identifiers carry their timeframe, so each graph only
/// reads the raw inputs that belong to it.
pub struct MultiTimeframeEngine {
    aggregator: MultiTimeframeAggregator,
    evaluators: BTreeMap<u8, Arc<dyn GraphEvaluator>>,
}

impl MultiTimeframeEngine {
    pub fn new(aggregator: MultiTimeframeAggregator) -> Self {
        Self {
            aggregator,
            evaluators: BTreeMap::new(),
        }
    }

    pub fn with_timeframe(mut self, timeframe: u8, evaluator: Arc<dyn GraphEvaluator>) -> Self {
        self.evaluators.insert(timeframe, evaluator);
        self
    }

    /// Loads every graph named by a strategy document and wires it to its
    /// timeframe.
    pub fn from_strategy(config: &StrategyConfig, catalog: &FunctionCatalog) -> Result<Self, ConfigError> {
        let mut engine = Self::new(MultiTimeframeAggregator::from_strategy(config)?);
        for timeframe in &config.timeframes {
            let graph = load_graph_config(&timeframe.graph)?;
            let runtime = GraphRuntime::from_config(&graph, catalog)?;
            engine = engine.with_timeframe(timeframe.timeframe, Arc::new(runtime));
        }
        Ok(engine)
    }

    pub fn aggregator(&self) -> &MultiTimeframeAggregator {
        &self.aggregator
    }

    pub fn timeframes(&self) -> impl Iterator<Item = &u8> {
        self.evaluators.keys()
    }

    /// Evaluates all timeframes concurrently, then votes.
    ///
    /// # Errors
    /// * `Evaluation` - a timeframe's pass failed structurally
    /// * `NoVotes` - no timeframe produced a usable signal
    pub fn evaluate(&self, raw_inputs: &RawInputs) -> Result<MultiTimeframeOutcome, AggregationError> {
        let passes: Vec<(u8, Result<Evaluation, _>)> = self
            .evaluators
            .par_iter()
            .map(|(timeframe, evaluator)| (*timeframe, evaluator.evaluate(raw_inputs)))
            .collect();

        // collected in timeframe order; the first structural failure wins
        let mut evaluations = BTreeMap::new();
        for (timeframe, pass) in passes {
            let evaluation = pass.map_err(|source| AggregationError::Evaluation { timeframe, source })?;
            evaluations.insert(timeframe, evaluation);
        }

        let signal = self.aggregator.aggregate(&evaluations)?;
        Ok(MultiTimeframeOutcome { evaluations, signal })
    }
}
