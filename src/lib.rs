// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod aggregator;    // multi-timeframe vote
pub mod config;        // graph documents, registry, validation
pub mod engine;        // compiler, evaluator, hot-reload runtime
pub mod errors;        // error handling
pub mod functions;     // combinator library + business function catalog
pub mod identifier;    // TPI^L-SSS codec
pub mod logging;
pub mod observability;
pub mod traits;        // NodeFunction and GraphEvaluator seams
pub mod value;
