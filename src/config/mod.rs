// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod dependency_graph;
mod loader;
mod node;
mod raw_sources;
mod registry;
mod validation;

#[cfg(test)]
mod integration_tests;
pub mod consts;

pub use dependency_graph::DependencyGraph;
pub use loader::{
    build_definitions, load_graph_config, load_raw_inputs, load_strategy_config,
    parse_graph_config, ConfigFormat, EngineOptions, GraphConfig, NodeConfig, StrategyConfig,
    TimeframeConfig,
};
pub use node::{NodeDefinition, OutputSchema};
pub use raw_sources::RawSources;
pub use registry::NodeRegistry;
pub use validation::{validate_hierarchy, HierarchyViolation, ValidationReport, ViolationKind};
