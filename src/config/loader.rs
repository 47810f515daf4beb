// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::aggregator::TieBreak;
use crate::config::consts::{DEFAULT_BUDGET_MS, DEFAULT_GRAPH_NAME, DEFAULT_VALUE_PARAMETER};
use crate::config::{NodeDefinition, OutputSchema, RawSources};
use crate::engine::{CachePolicy, RawInputs};
use crate::errors::ConfigError;
use crate::functions::{FunctionCatalog, FunctionFactory, Parameters};
use crate::identifier::Identifier;
use crate::value::Value;

/// A graph document: engine options, raw sources and node records.
///
/// # Example
/// ```yaml
/// name: trend-1m
/// engine:
///   budget_ms: 30
///   cache_policy: per_pass
/// raw_inputs: ["110^0-900"]
/// nodes:
///   - id: "110^1-000"
///     layer: 1
///     function: sign
///     inputs: ["110^0-900"]
///     parameters:
///       default: 0
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default = "default_graph_name")]
    pub name: String,
    #[serde(default)]
    pub engine: EngineOptions,
    #[serde(default)]
    pub raw_inputs: Vec<String>,
    #[serde(default)]
    pub nodes: Vec<NodeConfig>,
}

/// Engine settings for one graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineOptions {
    #[serde(default = "default_budget_ms")]
    pub budget_ms: u64,
    #[serde(default)]
    pub cache_policy: CachePolicy,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            budget_ms: DEFAULT_BUDGET_MS,
            cache_policy: CachePolicy::default(),
        }
    }
}

impl EngineOptions {
    pub fn budget(&self) -> Duration {
        Duration::from_millis(self.budget_ms)
    }
}

/// One node record as written in a graph document.
///
/// Identifiers stay textual here so that every malformed record can be
/// reported with its original spelling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub id: String,
    pub layer: u32,
    pub function: String,
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default)]
    pub outputs: OutputSchema,
    #[serde(default)]
    pub parameters: Parameters,
}

/// A multi-timeframe strategy document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub strategy: String,
    #[serde(default)]
    pub tie_break: TieBreak,
    pub timeframes: Vec<TimeframeConfig>,
}

/// One timeframe of a strategy: its vote weight, the graph that computes it
/// and the node whose value is its final signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeframeConfig {
    pub timeframe: u8,
    pub weight: f64,
    /// Resolved against the strategy document's directory on load.
    pub graph: PathBuf,
    pub signal: String,
    #[serde(default)]
    pub extensions: BTreeMap<String, Value>,
}

fn default_graph_name() -> String {
    DEFAULT_GRAPH_NAME.to_string()
}

fn default_budget_ms() -> u64 {
    DEFAULT_BUDGET_MS
}

/// Document formats, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
    Json,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match extension.as_str() {
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            "toml" => Ok(ConfigFormat::Toml),
            "json" => Ok(ConfigFormat::Json),
            _ => Err(ConfigError::UnsupportedFormat { extension }),
        }
    }

    pub fn parse<T: DeserializeOwned>(&self, content: &str) -> Result<T, ConfigError> {
        Ok(match self {
            ConfigFormat::Yaml => serde_yaml::from_str(content)?,
            ConfigFormat::Toml => toml::from_str(content)?,
            ConfigFormat::Json => serde_json::from_str(content)?,
        })
    }
}

fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let format = ConfigFormat::from_path(path)?;
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    format.parse(&content)
}

/// Load a graph document from a YAML, TOML or JSON file.
pub fn load_graph_config<P: AsRef<Path>>(path: P) -> Result<GraphConfig, ConfigError> {
    load_document(path.as_ref())
}

pub fn parse_graph_config(content: &str, format: ConfigFormat) -> Result<GraphConfig, ConfigError> {
    format.parse(content)
}

/// Load a strategy document. Relative graph paths are resolved against the
/// document's directory.
pub fn load_strategy_config<P: AsRef<Path>>(path: P) -> Result<StrategyConfig, ConfigError> {
    let path = path.as_ref();
    let mut config: StrategyConfig = load_document(path)?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));
    for timeframe in &mut config.timeframes {
        if timeframe.graph.is_relative() {
            timeframe.graph = base.join(&timeframe.graph);
        }
    }
    Ok(config)
}

/// Load a raw input document: a map from identifier to value.
pub fn load_raw_inputs<P: AsRef<Path>>(path: P) -> Result<RawInputs, ConfigError> {
    let document: BTreeMap<String, Value> = load_document(path.as_ref())?;
    document
        .into_iter()
        .map(|(raw, value)| Ok((parse_id(&raw, "raw input document")?, value)))
        .collect()
}

/// Turns node records into definitions, resolving every function name
/// against the built-ins and `catalog`.
///
/// All malformed records are reported, not just the first. Registry-level
/// checks (duplicates, layer agreement) are left to the registry.
pub fn build_definitions(
    config: &GraphConfig,
    catalog: &FunctionCatalog,
) -> Result<(Vec<NodeDefinition>, RawSources), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let mut raw_sources = RawSources::new();
    for raw in &config.raw_inputs {
        match parse_id(raw, "raw_inputs") {
            Ok(id) => {
                if !raw_sources.add(id) {
                    errors.push(ConfigError::Invalid(format!("raw input '{id}' declared twice")));
                }
            }
            Err(e) => errors.push(e),
        }
    }

    let mut definitions = Vec::with_capacity(config.nodes.len());
    for node in &config.nodes {
        match build_definition(node, catalog) {
            Ok(definition) => definitions.push(definition),
            Err(mut node_errors) => errors.append(&mut node_errors),
        }
    }

    if errors.is_empty() {
        Ok((definitions, raw_sources))
    } else {
        Err(errors)
    }
}

fn build_definition(
    node: &NodeConfig,
    catalog: &FunctionCatalog,
) -> Result<NodeDefinition, Vec<ConfigError>> {
    let mut errors = Vec::new();

    let id = parse_id(&node.id, "node id").map_err(|e| errors.push(e)).ok();
    let inputs: Vec<Identifier> = node
        .inputs
        .iter()
        .filter_map(|raw| parse_id(raw, "node inputs").map_err(|e| errors.push(e)).ok())
        .collect();
    let function = FunctionFactory::create_function(
        &node.id,
        &node.function,
        &node.parameters,
        node.inputs.len(),
        catalog,
    )
    .map_err(|e| errors.push(e))
    .ok();
    let default_value = match node.parameters.get(DEFAULT_VALUE_PARAMETER) {
        None => Some(Value::default()),
        Some(raw) => {
            let value = Value::from_yaml(raw);
            if value.is_none() {
                errors.push(ConfigError::InvalidParameter {
                    node: node.id.clone(),
                    parameter: DEFAULT_VALUE_PARAMETER.to_string(),
                    reason: "must be a scalar value".to_string(),
                });
            }
            value
        }
    };

    match (id, function, default_value) {
        (Some(id), Some(function), Some(default_value)) if errors.is_empty() => {
            Ok(NodeDefinition::new(id, function)
                .with_layer(node.layer)
                .with_inputs(inputs)
                .with_outputs(node.outputs.clone())
                .with_parameters(node.parameters.clone())
                .with_default(default_value))
        }
        _ => Err(errors),
    }
}

fn parse_id(raw: &str, context: &'static str) -> Result<Identifier, ConfigError> {
    raw.parse()
        .map_err(|source| ConfigError::InvalidIdentifier {
            raw: raw.to_string(),
            context,
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::IdentifierError;
    use crate::functions::{Combinator, FunctionKind};
    use std::fs;

    const GRAPH_YAML: &str = r#"
name: sample
engine:
  budget_ms: 5
  cache_policy: reuse_identical_inputs
raw_inputs: ["110^0-900"]
nodes:
  - id: "110^1-000"
    layer: 1
    function: sign
    inputs: ["110^0-900"]
    parameters:
      default: -1
  - id: "110^2-000"
    layer: 2
    function: count_equals
    inputs: ["110^1-000", "110^0-900"]
    outputs:
      count: integer
    parameters:
      target: 1
"#;

    #[test]
    fn test_parse_yaml_graph() {
        let config = parse_graph_config(GRAPH_YAML, ConfigFormat::Yaml).unwrap();
        assert_eq!(config.name, "sample");
        assert_eq!(config.engine.budget(), Duration::from_millis(5));
        assert_eq!(config.engine.cache_policy, CachePolicy::ReuseIdenticalInputs);
        assert_eq!(config.nodes.len(), 2);
        assert_eq!(config.nodes[1].inputs, vec!["110^1-000", "110^0-900"]);
    }

    #[test]
    fn test_defaults_when_sections_are_omitted() {
        let config = parse_graph_config("nodes: []", ConfigFormat::Yaml).unwrap();
        assert_eq!(config.name, DEFAULT_GRAPH_NAME);
        assert_eq!(config.engine, EngineOptions::default());
        assert_eq!(config.engine.budget_ms, 30);
        assert!(config.raw_inputs.is_empty());
    }

    #[test]
    fn test_build_definitions() {
        let config = parse_graph_config(GRAPH_YAML, ConfigFormat::Yaml).unwrap();
        let (definitions, raw_sources) = build_definitions(&config, &FunctionCatalog::new()).unwrap();

        assert!(raw_sources.contains(&"110^0-900".parse().unwrap()));
        assert_eq!(definitions[0].default_value, Value::Integer(-1));
        assert!(matches!(
            definitions[0].function,
            FunctionKind::Combinator(Combinator::Sign)
        ));
        assert!(matches!(
            definitions[1].function,
            FunctionKind::Combinator(Combinator::CountEquals { arity: 2, target }) if target == 1.0
        ));
        assert_eq!(definitions[1].default_value, Value::Integer(0));
    }

    #[test]
    fn test_build_definitions_reports_every_bad_record() {
        let yaml = r#"
raw_inputs: ["bad"]
nodes:
  - id: "110^1-0"
    layer: 1
    function: sign
  - id: "110^1-001"
    layer: 1
    function: does_not_exist
    inputs: ["110^0-900", "1100^0-000"]
"#;
        let config = parse_graph_config(yaml, ConfigFormat::Yaml).unwrap();
        let errors = build_definitions(&config, &FunctionCatalog::new()).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(matches!(
            &errors[0],
            ConfigError::InvalidIdentifier { context: "raw_inputs", .. }
        ));
        assert!(matches!(
            &errors[1],
            ConfigError::InvalidIdentifier {
                source: IdentifierError::MalformedIdentifier { .. },
                ..
            }
        ));
        assert!(errors
            .iter()
            .any(|e| e.to_string() == "node '110^1-001' references unknown function 'does_not_exist'"));
    }

    #[test]
    fn test_declared_layer_is_kept_for_registry_check() {
        let yaml = r#"
nodes:
  - id: "110^1-000"
    layer: 2
    function: sign
"#;
        let config = parse_graph_config(yaml, ConfigFormat::Yaml).unwrap();
        let (definitions, _) = build_definitions(&config, &FunctionCatalog::new()).unwrap();
        assert_eq!(definitions[0].layer, 2);
        assert_eq!(definitions[0].id.layer(), 1);
    }

    #[test]
    fn test_load_graph_in_all_formats() {
        let dir = tempfile::tempdir().unwrap();

        let yaml = dir.path().join("graph.yml");
        fs::write(&yaml, GRAPH_YAML).unwrap();

        let toml = dir.path().join("graph.toml");
        fs::write(
            &toml,
            r#"
name = "sample"
raw_inputs = ["110^0-900"]

[[nodes]]
id = "110^1-000"
layer = 1
function = "sign"
inputs = ["110^0-900"]
parameters = { default = -1 }
"#,
        )
        .unwrap();

        let json = dir.path().join("graph.json");
        fs::write(
            &json,
            r#"{"name": "sample", "raw_inputs": ["110^0-900"],
                "nodes": [{"id": "110^1-000", "layer": 1, "function": "sign",
                           "inputs": ["110^0-900"], "parameters": {"default": -1}}]}"#,
        )
        .unwrap();

        for path in [&yaml, &toml, &json] {
            let config = load_graph_config(path).unwrap();
            assert_eq!(config.name, "sample");
            let (definitions, _) = build_definitions(&config, &FunctionCatalog::new()).unwrap();
            assert_eq!(definitions[0].default_value, Value::Integer(-1));
        }
    }

    #[test]
    fn test_unsupported_extension_and_missing_file() {
        let err = load_graph_config("graph.ini").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat { ref extension } if extension == "ini"));

        let err = load_graph_config("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_raw_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inputs.json");
        fs::write(&path, r#"{"110^0-900": 1.5, "110^0-901": true, "110^0-902": "wait"}"#).unwrap();

        let inputs = load_raw_inputs(&path).unwrap();
        let id = |s: &str| -> Identifier { s.parse().unwrap() };
        assert_eq!(inputs[&id("110^0-900")], Value::Number(1.5));
        assert_eq!(inputs[&id("110^0-901")], Value::Boolean(true));
        assert_eq!(inputs[&id("110^0-902")], Value::from("wait"));

        fs::write(&path, r#"{"not-an-id": 1}"#).unwrap();
        assert!(matches!(
            load_raw_inputs(&path).unwrap_err(),
            ConfigError::InvalidIdentifier { .. }
        ));
    }

    #[test]
    fn test_strategy_graph_paths_resolve_against_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("strategy.yaml");
        fs::write(
            &path,
            r#"
strategy: swing
tie_break: lowest_value
timeframes:
  - timeframe: 1
    weight: 1.0
    graph: graphs/1m.yaml
    signal: "110^3-000"
  - timeframe: 2
    weight: 2.5
    graph: /abs/5m.yaml
    signal: "210^3-000"
    extensions:
      label: five
"#,
        )
        .unwrap();

        let config = load_strategy_config(&path).unwrap();
        assert_eq!(config.tie_break, TieBreak::LowestValue);
        assert_eq!(config.timeframes[0].graph, dir.path().join("graphs/1m.yaml"));
        assert_eq!(config.timeframes[1].graph, PathBuf::from("/abs/5m.yaml"));
        assert_eq!(config.timeframes[1].extensions["label"], Value::from("five"));
    }
}
