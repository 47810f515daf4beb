use crate::config::{
    build_definitions, load_graph_config, load_raw_inputs, load_strategy_config,
    validate_hierarchy, NodeRegistry, ViolationKind,
};
use crate::engine::ActiveGraph;
use crate::functions::FunctionCatalog;
use crate::identifier::Identifier;
use crate::value::Value;

fn config_path(name: &str) -> String {
    format!("{}/configs/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn registry_from(name: &str) -> NodeRegistry {
    let config = load_graph_config(config_path(name)).unwrap();
    let (definitions, raw_sources) = build_definitions(&config, &FunctionCatalog::new()).unwrap();
    NodeRegistry::from_definitions(definitions, raw_sources).unwrap()
}

/// Test that the diamond graph loads identically from YAML and TOML
#[test]
fn test_diamond_yaml_and_toml_agree() {
    let yaml = registry_from("diamond.yaml");
    let toml = registry_from("diamond.toml");

    assert_eq!(yaml.len(), 4);
    assert_eq!(yaml.layers(), toml.layers());
    for node in yaml.all_nodes() {
        let other = toml.get(&node.id).unwrap();
        assert_eq!(node.inputs, other.inputs);
        assert_eq!(node.function.name(), other.function.name());
    }
    assert!(validate_hierarchy(&yaml).is_ok());
}

/// Test that every sample graph passes validation
#[test]
fn test_signal_graphs_are_valid() {
    for name in ["signal-1m.yaml", "signal-5m.yaml"] {
        let registry = registry_from(name);
        assert!(validate_hierarchy(&registry).is_ok(), "{name} should validate");
        assert!(!registry.raw_sources().is_empty());
    }
}

/// Test that all layering violations of the invalid sample are reported together
#[test]
fn test_invalid_hierarchy_reports_everything() {
    let registry = registry_from("invalid-hierarchy.yaml");
    let report = validate_hierarchy(&registry);

    assert_eq!(report.violations.len(), 3);
    assert_eq!(report.count(ViolationKind::HorizontalReference), 1);
    assert_eq!(report.count(ViolationKind::BackwardReference), 1);
    assert_eq!(report.count(ViolationKind::UnregisteredDependency), 1);

    let config = load_graph_config(config_path("invalid-hierarchy.yaml")).unwrap();
    let (definitions, raw_sources) = build_definitions(&config, &FunctionCatalog::new()).unwrap();
    let err = ActiveGraph::build(definitions, raw_sources).unwrap_err();
    assert_eq!(err.violations.len(), 3);
    assert!(err.cycle.is_some());
    assert_eq!(err.messages().len(), 4);
}

/// Test the strategy document and its sample inputs
#[test]
fn test_strategy_and_inputs_load() {
    let strategy = load_strategy_config(config_path("strategy.yaml")).unwrap();
    assert_eq!(strategy.strategy, "swing");
    assert_eq!(strategy.timeframes.len(), 2);
    for timeframe in &strategy.timeframes {
        assert!(timeframe.graph.exists(), "{} should exist", timeframe.graph.display());
    }

    let inputs = load_raw_inputs(config_path("inputs-sample.json")).unwrap();
    let id: Identifier = "110^0-000".parse().unwrap();
    assert_eq!(inputs[&id], Value::Integer(5));
}
