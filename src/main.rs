// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;

use pkg_dag::aggregator::MultiTimeframeEngine;
use pkg_dag::config::{build_definitions, load_graph_config, load_raw_inputs, load_strategy_config};
use pkg_dag::engine::{ActiveGraph, GraphRuntime};
use pkg_dag::errors::ConfigError;
use pkg_dag::functions::FunctionCatalog;
use pkg_dag::identifier::Identifier;
use pkg_dag::logging::{init_logging, LogLevel};

/// Evaluate layered PKG feature/signal graphs.
#[derive(Debug, Parser)]
#[command(name = "pkg-dag", version, about, long_about = None)]
struct Cli {
    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PKG_DAG_LOG` or `warn` is used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Register, validate and compile a graph, reporting every problem.
    Validate { graph: PathBuf },
    /// Print the compiled execution order, grouped by layer.
    Order { graph: PathBuf },
    /// Run one evaluation pass and print the node results as JSON.
    Eval {
        graph: PathBuf,
        /// Raw input document (JSON or YAML map of identifier to value).
        #[arg(long, value_name = "PATH")]
        inputs: PathBuf,
        /// Only print these node identifiers.
        #[arg(long, value_name = "ID", num_args = 1..)]
        only: Vec<Identifier>,
    },
    /// Evaluate every timeframe of a strategy and print the weighted vote.
    Vote {
        strategy: PathBuf,
        #[arg(long, value_name = "PATH")]
        inputs: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_logging(cli.log_level) {
        eprintln!("warning: logging not initialised: {e}");
    }

    match run(cli.command) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            if let Some(config_error) = e.downcast_ref::<ConfigError>() {
                for line in describe(config_error) {
                    eprintln!("  - {line}");
                }
            }
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<ExitCode> {
    let catalog = FunctionCatalog::new();
    match command {
        Command::Validate { graph } => {
            let active = match build_active(&graph, &catalog)? {
                Ok(active) => active,
                Err(lines) => {
                    println!("{}: invalid", graph.display());
                    for line in lines {
                        println!("  - {line}");
                    }
                    return Ok(ExitCode::FAILURE);
                }
            };
            let registry = active.registry();
            println!(
                "{}: ok ({} nodes, {} raw inputs, {} layers)",
                graph.display(),
                registry.len(),
                registry.raw_sources().len(),
                registry.layers().len()
            );
            Ok(ExitCode::SUCCESS)
        }
        Command::Order { graph } => {
            let active = match build_active(&graph, &catalog)? {
                Ok(active) => active,
                Err(lines) => {
                    for line in lines {
                        eprintln!("{line}");
                    }
                    return Ok(ExitCode::FAILURE);
                }
            };
            for (layer, ids) in active.order().levels() {
                let ids: Vec<String> = ids.iter().map(Identifier::encode).collect();
                println!("layer {layer}: {}", ids.join(" "));
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Eval { graph, inputs, only } => {
            let config = load_graph_config(&graph)
                .with_context(|| format!("loading graph {}", graph.display()))?;
            let runtime = GraphRuntime::from_config(&config, &catalog)?;
            let raw_inputs = load_raw_inputs(&inputs)
                .with_context(|| format!("loading raw inputs {}", inputs.display()))?;

            let evaluation = runtime.evaluate(&raw_inputs)?;
            let results: BTreeMap<_, _> = evaluation
                .results
                .iter()
                .filter(|(id, _)| only.is_empty() || only.contains(*id))
                .collect();
            let output = json!({
                "graph": runtime.name(),
                "generation": runtime.generation(),
                "results": results,
                "total_us": evaluation.metrics.total.as_micros() as u64,
                "budget_exceeded": evaluation.metrics.budget_exceeded,
                "warnings": evaluation.metrics.warnings,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Vote { strategy, inputs } => {
            let config = load_strategy_config(&strategy)
                .with_context(|| format!("loading strategy {}", strategy.display()))?;
            let engine = MultiTimeframeEngine::from_strategy(&config, &catalog)?;
            let raw_inputs = load_raw_inputs(&inputs)
                .with_context(|| format!("loading raw inputs {}", inputs.display()))?;

            let outcome = engine.evaluate(&raw_inputs)?;
            let output = json!({
                "strategy": engine.aggregator().strategy(),
                "signal": outcome.signal,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Loads and builds a graph. The inner `Err` carries graph problems to
/// report; the outer one is for documents that could not be read at all.
fn build_active(
    graph: &Path,
    catalog: &FunctionCatalog,
) -> Result<std::result::Result<ActiveGraph, Vec<String>>> {
    let config = load_graph_config(graph).with_context(|| format!("loading graph {}", graph.display()))?;
    let (definitions, raw_sources) = match build_definitions(&config, catalog) {
        Ok(built) => built,
        Err(errors) => return Ok(Err(errors.iter().map(ToString::to_string).collect())),
    };
    Ok(ActiveGraph::build(definitions, raw_sources).map_err(|e| e.messages()))
}

fn describe(error: &ConfigError) -> Vec<String> {
    match error {
        ConfigError::InvalidRecords { errors, .. } => errors.iter().map(ToString::to_string).collect(),
        ConfigError::Rejected(reload) => reload.messages(),
        _ => Vec::new(),
    }
}
