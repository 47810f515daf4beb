// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod compiler;
pub mod context;
pub mod evaluator;
pub mod runtime;
#[cfg(test)]
mod integration_tests;

pub use compiler::{compile, CompiledOrder};
pub use context::{CachePolicy, ExecutionContext, PassMemo, RawInputs};
pub use evaluator::{
    evaluate, EngineWarning, Evaluation, EvaluationMetrics, ExecutionEngine, NodeErrorKind,
    NodeResult,
};
pub use runtime::{ActiveGraph, GraphRuntime};
